// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashMap;
use std::num::NonZeroU32;

use crate::app::core::{Authenticator, AuthenticatorId};

/// Length of one code validity window, in seconds. Every item shares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window(NonZeroU32);

impl Window {
    pub const STANDARD: Window = Window(NonZeroU32::new(30).unwrap());

    pub fn new(seconds: u32) -> Option<Self> {
        NonZeroU32::new(seconds).map(Self)
    }

    pub fn seconds(self) -> u64 {
        u64::from(self.0.get())
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Seconds left in the current window, in `1..=window`.
///
/// A boundary instant reads as the full window, never as zero.
pub fn remaining_in_window(now_local: i64, offset: i64, window: Window) -> u64 {
    let length = i64::from(window.0.get());
    let synced = now_local.saturating_add(offset);

    (length - synced.rem_euclid(length)) as u64
}

/// Which window (counted from the unix epoch) a synced instant falls in
pub fn window_index(now_local: i64, offset: i64, window: Window) -> i64 {
    now_local
        .saturating_add(offset)
        .div_euclid(i64::from(window.0.get()))
}

/// Countdown reading for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub remaining: u64,
    pub window_index: i64,
}

impl Tick {
    pub fn at(now_local: i64, offset: i64, window: Window) -> Self {
        Self {
            remaining: remaining_in_window(now_local, offset, window),
            window_index: window_index(now_local, offset, window),
        }
    }
}

/// Remaining seconds per displayed item.
///
/// Rebuilt from the server figures on every snapshot, overwritten with the
/// computed value on every tick after that.
#[derive(Debug, Clone, Default)]
pub struct Countdown {
    remaining: HashMap<AuthenticatorId, u64>,
}

impl Countdown {
    /// Seeds from the server-reported `remaining_time` to avoid a visible jump.
    /// Values outside `1..=window` (the server reports 0 when it could not
    /// produce a code) fall back to `computed`.
    pub fn seed(&mut self, items: &[Authenticator], window: Window, computed: u64) {
        self.remaining = items
            .iter()
            .map(|item| {
                let seconds = if (1..=window.seconds()).contains(&item.remaining_time) {
                    item.remaining_time
                } else {
                    computed
                };
                (item.id, seconds)
            })
            .collect();
    }

    pub fn advance(&mut self, remaining: u64) {
        self.remaining.values_mut().for_each(|value| *value = remaining);
    }

    pub fn get(&self, id: AuthenticatorId) -> Option<u64> {
        self.remaining.get(&id).copied()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, remaining_time: u64) -> Authenticator {
        Authenticator {
            id: AuthenticatorId(id),
            name: format!("item {id}"),
            email: String::from("me@example.com"),
            totp_code: String::from("000000"),
            remaining_time,
        }
    }

    #[test]
    fn remaining_stays_within_window() {
        for length in [1, 2, 7, 30, 60, 300] {
            let window = Window::new(length).expect("non-zero");
            for now in -700..700 {
                for offset in [-95, -31, -1, 0, 1, 29, 61] {
                    let remaining = remaining_in_window(now, offset, window);
                    assert!(
                        (1..=window.seconds()).contains(&remaining),
                        "now={now} offset={offset} window={length} -> {remaining}"
                    );
                }
            }
        }
    }

    #[test]
    fn remaining_is_periodic_in_window_length() {
        let window = Window::STANDARD;
        for now in 1_700_000_000..1_700_000_120 {
            for shift in [-3, -1, 1, 2, 1_000] {
                assert_eq!(
                    remaining_in_window(now, 4, window),
                    remaining_in_window(now + shift * 30, 4, window)
                );
            }
        }
    }

    #[test]
    fn boundary_reads_as_full_window() {
        let window = Window::STANDARD;

        // 1_700_000_020 - 10 is a multiple of 30
        assert_eq!(remaining_in_window(1_700_000_020, -10, window), 30);
        assert_eq!(remaining_in_window(1_700_000_021, -10, window), 29);
        assert_eq!(remaining_in_window(1_700_000_049, -10, window), 1);
        assert_eq!(remaining_in_window(0, 0, window), 30);
    }

    #[test]
    fn negative_synced_time_still_counts_down() {
        let window = Window::STANDARD;

        assert_eq!(remaining_in_window(-1, 0, window), 1);
        assert_eq!(remaining_in_window(-30, 0, window), 30);
        assert_eq!(window_index(-1, 0, window), -1);
    }

    #[test]
    fn window_index_changes_exactly_at_boundary() {
        let window = Window::STANDARD;

        assert_eq!(window_index(59, 0, window), 1);
        assert_eq!(window_index(60, 0, window), 2);
        assert_eq!(Tick::at(60, 0, window), Tick { remaining: 30, window_index: 2 });
    }

    #[test]
    fn window_rejects_zero() {
        assert_eq!(Window::new(0), None);
        assert_eq!(Window::default().seconds(), 30);
    }

    #[test]
    fn seed_uses_server_figures_then_ticks_take_over() {
        let window = Window::STANDARD;
        let mut countdown = Countdown::default();

        countdown.seed(&[item(1, 17), item(2, 0), item(3, 99)], window, 16);
        assert_eq!(countdown.len(), 3);
        assert_eq!(countdown.get(AuthenticatorId(1)), Some(17));
        assert_eq!(countdown.get(AuthenticatorId(2)), Some(16));
        assert_eq!(countdown.get(AuthenticatorId(3)), Some(16));

        countdown.advance(15);
        assert_eq!(countdown.get(AuthenticatorId(1)), Some(15));
        assert_eq!(countdown.get(AuthenticatorId(2)), Some(15));
        assert_eq!(countdown.get(AuthenticatorId(4)), None);
    }

    #[test]
    fn seed_replaces_previous_set() {
        let window = Window::STANDARD;
        let mut countdown = Countdown::default();

        countdown.seed(&[item(1, 10), item(2, 10)], window, 10);
        countdown.seed(&[item(3, 9)], window, 9);

        assert_eq!(countdown.len(), 1);
        assert_eq!(countdown.get(AuthenticatorId(1)), None);

        countdown.seed(&[], window, 9);
        assert!(countdown.is_empty());
    }
}
