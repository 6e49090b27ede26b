// SPDX-License-Identifier: GPL-3.0-only

mod countdown;
mod toast;

pub use countdown::countdown_badge;
pub use toast::{Toast, Toasts};

#[cfg(test)]
pub use toast::ToastLevel;
