// SPDX-License-Identifier: GPL-3.0-only

use super::countdown::{Tick, Window};

/// Where the boundary latch currently is.
///
/// `Idle -> Armed` on a tick that fires, `Armed -> Cooldown` on the next
/// tick, `Cooldown -> Idle` once the remaining time drops under
/// `window - guard_margin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchState {
    Idle,
    Armed,
    Cooldown,
}

/// Edge detector that asks for one automatic refresh per window boundary.
///
/// A boundary is caught by the first tick of a new window that still reads
/// within `guard_margin` seconds of the full window, so a late or skipped
/// tick does not lose it. The latch remembers which window it fired for:
/// a boundary of any other window fires even if the hysteresis never
/// released, and the same window never fires twice.
#[derive(Debug, Clone)]
pub struct BoundaryTrigger {
    window: Window,
    guard_margin: u64,
    state: LatchState,
    fired_for: Option<i64>,
}

impl BoundaryTrigger {
    pub fn new(window: Window, guard_margin: u64) -> Self {
        Self {
            window,
            guard_margin: guard_margin.min(window.seconds().saturating_sub(1)),
            state: LatchState::Idle,
            fired_for: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> LatchState {
        self.state
    }

    pub fn is_latched(&self) -> bool {
        self.state != LatchState::Idle
    }

    /// Feeds one countdown reading. Returns `true` when an automatic refresh
    /// should be started.
    pub fn on_tick(&mut self, tick: Tick, has_items: bool) -> bool {
        let floor = self.window.seconds() - self.guard_margin;

        if tick.remaining >= floor && has_items && self.fired_for != Some(tick.window_index) {
            if self.is_latched() {
                tracing::debug!(
                    "Latch still held from window {:?}, firing for window {}",
                    self.fired_for,
                    tick.window_index
                );
            }
            self.state = LatchState::Armed;
            self.fired_for = Some(tick.window_index);
            return true;
        }

        if self.state == LatchState::Armed {
            self.state = LatchState::Cooldown;
        }
        if self.state == LatchState::Cooldown && tick.remaining < floor {
            self.state = LatchState::Idle;
        }

        false
    }

    /// Records that codes of `window_index` are already on screen, so its
    /// boundary needs no automatic refresh.
    pub fn mark_fresh(&mut self, window_index: i64) {
        if self.fired_for < Some(window_index) {
            self.fired_for = Some(window_index);
        }
    }

    /// Back to a fresh latch, used when the view is torn down
    pub fn reset(&mut self) {
        self.state = LatchState::Idle;
        self.fired_for = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger() -> BoundaryTrigger {
        BoundaryTrigger::new(Window::STANDARD, 2)
    }

    fn tick_at(now: i64) -> Tick {
        Tick::at(now, 0, Window::STANDARD)
    }

    /// Ticks once per second over `[from, to)` and returns the instants that fired
    fn run(trigger: &mut BoundaryTrigger, from: i64, to: i64) -> Vec<i64> {
        (from..to)
            .filter(|now| trigger.on_tick(tick_at(*now), true))
            .collect()
    }

    #[test]
    fn fires_once_per_boundary() {
        let mut trigger = trigger();

        let fired = run(&mut trigger, 3, 30 * 10 + 1);

        assert_eq!(fired, (1..=10).map(|n| n * 30).collect::<Vec<_>>());
    }

    #[test]
    fn walks_armed_cooldown_idle() {
        let mut trigger = trigger();

        assert!(trigger.on_tick(tick_at(30), true));
        assert_eq!(trigger.state(), LatchState::Armed);

        assert!(!trigger.on_tick(tick_at(31), true));
        assert_eq!(trigger.state(), LatchState::Cooldown);

        assert!(!trigger.on_tick(tick_at(32), true));
        assert_eq!(trigger.state(), LatchState::Cooldown);

        // 27 remaining is below 30 - 2
        assert!(!trigger.on_tick(tick_at(33), true));
        assert_eq!(trigger.state(), LatchState::Idle);
    }

    #[test]
    fn repeated_boundary_reading_does_not_refire() {
        let mut trigger = trigger();

        assert!(trigger.on_tick(tick_at(60), true));
        assert!(!trigger.on_tick(tick_at(60), true));
        assert!(!trigger.on_tick(tick_at(60), true));
    }

    #[test]
    fn offset_jitter_around_boundary_does_not_refire() {
        let mut trigger = trigger();

        assert!(trigger.on_tick(tick_at(60), true));
        assert!(!trigger.on_tick(tick_at(61), true));
        assert!(!trigger.on_tick(tick_at(62), true));
        assert!(!trigger.on_tick(tick_at(63), true));
        assert_eq!(trigger.state(), LatchState::Idle);

        // an offset correction drags the clock back onto the same boundary
        assert!(!trigger.on_tick(tick_at(60), true));
    }

    #[test]
    fn empty_set_never_fires() {
        let mut trigger = trigger();

        for now in 0..200 {
            assert!(!trigger.on_tick(tick_at(now), false));
        }
        assert_eq!(trigger.state(), LatchState::Idle);
    }

    #[test]
    fn recovers_after_suspended_timer() {
        let mut trigger = trigger();

        assert!(trigger.on_tick(tick_at(30), true));
        // the host stops delivering ticks, they resume exactly on a later boundary
        assert!(trigger.on_tick(tick_at(120), true));
        assert!(!trigger.on_tick(tick_at(121), true));
        assert_eq!(run(&mut trigger, 122, 151), vec![150]);
    }

    #[test]
    fn gap_longer_than_guard_margin_skips_boundary_only() {
        let mut trigger = trigger();

        assert_eq!(run(&mut trigger, 25, 40), vec![30]);
        // ticks vanish across the 60 boundary
        assert_eq!(run(&mut trigger, 75, 100), vec![90]);
        assert_eq!(run(&mut trigger, 100, 200), vec![120, 150, 180]);
    }

    #[test]
    fn boundary_tick_one_second_late_still_fires() {
        let mut trigger = trigger();

        assert_eq!(run(&mut trigger, 33, 60), Vec::<i64>::new());
        // the tick for 60 never comes, the next one reads 29
        assert_eq!(run(&mut trigger, 61, 95), vec![61, 90]);
    }

    #[test]
    fn boundary_late_by_guard_margin_still_fires() {
        let mut trigger = trigger();

        assert_eq!(run(&mut trigger, 33, 59), Vec::<i64>::new());
        assert_eq!(run(&mut trigger, 62, 95), vec![62, 90]);
        assert_eq!(trigger.state(), LatchState::Idle);
    }

    #[test]
    fn late_tick_fires_once_for_its_window() {
        let mut trigger = trigger();

        assert!(trigger.on_tick(tick_at(61), true));
        assert!(!trigger.on_tick(tick_at(62), true));
        assert!(!trigger.on_tick(tick_at(60), true));
    }

    #[test]
    fn fresh_window_needs_no_refresh() {
        let mut trigger = trigger();

        trigger.mark_fresh(2);
        assert_eq!(run(&mut trigger, 60, 95), vec![90]);

        // an older fetch landing late does not move the latch back
        trigger.mark_fresh(2);
        trigger.mark_fresh(1);
        assert!(!trigger.on_tick(tick_at(91), true));
    }

    #[test]
    fn next_boundary_fires_even_if_hysteresis_never_released() {
        // a margin this wide means no reading is ever low enough to release
        let window = Window::new(3).expect("non-zero");
        let mut trigger = BoundaryTrigger::new(window, 10);
        let tick = |now| Tick::at(now, 0, window);

        assert!(trigger.on_tick(tick(3), true));
        assert!(!trigger.on_tick(tick(4), true));
        assert!(!trigger.on_tick(tick(5), true));
        assert_eq!(trigger.state(), LatchState::Cooldown);

        assert!(trigger.on_tick(tick(6), true));
        assert!(!trigger.on_tick(tick(6), true));
    }

    #[test]
    fn reset_forgets_fired_window() {
        let mut trigger = trigger();

        assert!(trigger.on_tick(tick_at(30), true));
        trigger.reset();
        assert!(!trigger.is_latched());
        assert!(trigger.on_tick(tick_at(30), true));
    }
}
