// SPDX-License-Identifier: GPL-3.0-only

//! Keeps the displayed countdown in step with the server and refreshes the
//! codes once per window boundary.

mod clock;
mod countdown;
mod engine;
mod refresh;
mod trigger;

pub use clock::SystemClock;
pub use countdown::Window;
pub use engine::{RefreshOutcome, SyncEngine};
pub use refresh::{RefreshMode, RefreshTicket};
