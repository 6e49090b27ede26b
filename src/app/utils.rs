// SPDX-License-Identifier: GPL-3.0-only

mod input;
pub mod style;

pub use input::InputableAuthenticator;
