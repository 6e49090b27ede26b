// SPDX-License-Identifier: GPL-3.0-only

use crate::app::core::{ApiError, Authenticator, AuthenticatorId, Snapshot};

use super::clock::{Clock, ClockOffset, SystemClock};
use super::countdown::{Countdown, Tick, Window, remaining_in_window, window_index};
use super::refresh::{RefreshCoordinator, RefreshMode, RefreshTicket};
use super::trigger::BoundaryTrigger;

/// What became of a completed refresh
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The snapshot replaced the item set
    Applied { next: Option<RefreshTicket> },
    /// Nothing changed on screen, the error should be surfaced
    Failed {
        mode: RefreshMode,
        error: ApiError,
        next: Option<RefreshTicket>,
    },
    /// The ticket was not the one in flight (the view was torn down meanwhile)
    Discarded,
}

impl RefreshOutcome {
    /// Refresh the caller must start right away, parked while this one ran
    pub fn next(&self) -> Option<RefreshTicket> {
        match self {
            RefreshOutcome::Applied { next } | RefreshOutcome::Failed { next, .. } => *next,
            RefreshOutcome::Discarded => None,
        }
    }
}

/// Owns every piece of timer state of the code view.
///
/// Every method runs to completion; the network calls happen outside, between
/// a `begin`/`request` call and its matching completion.
#[derive(Debug)]
pub struct SyncEngine<C = SystemClock> {
    clock: C,
    window: Window,
    offset: ClockOffset,
    countdown: Countdown,
    trigger: BoundaryTrigger,
    refresh: RefreshCoordinator,
    items: Vec<Authenticator>,
}

impl<C: Clock> SyncEngine<C> {
    pub fn new(clock: C, window: Window, guard_margin: u64) -> Self {
        Self {
            clock,
            window,
            offset: ClockOffset::default(),
            countdown: Countdown::default(),
            trigger: BoundaryTrigger::new(window, guard_margin),
            refresh: RefreshCoordinator::default(),
            items: Vec::new(),
        }
    }

    /// Once-per-second step: recomputes the countdown and, on a boundary,
    /// starts an automatic refresh whose ticket is returned.
    pub fn tick(&mut self) -> Option<RefreshTicket> {
        let now = self.clock.now();
        let tick = Tick::at(now, self.offset.seconds(), self.window);

        self.countdown.advance(tick.remaining);

        if self.trigger.on_tick(tick, !self.items.is_empty()) {
            tracing::debug!("Window {} began, refreshing codes", tick.window_index);
            return self.refresh.begin(RefreshMode::Automatic, now);
        }

        None
    }

    /// Single refresh entry point
    pub fn request_refresh(&mut self, mode: RefreshMode) -> Option<RefreshTicket> {
        self.refresh.begin(mode, self.clock.now())
    }

    pub fn manual_refresh(&mut self) -> Option<RefreshTicket> {
        self.request_refresh(RefreshMode::Manual)
    }

    /// Applies the result of the fetch started with `ticket`
    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Snapshot, ApiError>,
    ) -> RefreshOutcome {
        if !self.refresh.finish(ticket) {
            tracing::debug!("Dropping result of a {} refresh nobody waits for", ticket.mode());
            return RefreshOutcome::Discarded;
        }

        let applied = match result {
            Ok(snapshot) => {
                self.apply(ticket.started_at(), snapshot);
                Ok(())
            }
            Err(error) => {
                tracing::error!("{} refresh failed: {}", ticket.mode(), error);
                Err(error)
            }
        };

        let next = self.refresh.start_pending(self.clock.now());
        match applied {
            Ok(()) => RefreshOutcome::Applied { next },
            Err(error) => RefreshOutcome::Failed {
                mode: ticket.mode(),
                error,
                next,
            },
        }
    }

    fn apply(&mut self, local_at_call: i64, snapshot: Snapshot) {
        self.offset.observe(local_at_call, snapshot.server_time);
        self.trigger.mark_fresh(window_index(local_at_call, self.offset.seconds(), self.window));

        let computed = remaining_in_window(self.clock.now(), self.offset.seconds(), self.window);
        self.countdown.seed(&snapshot.items, self.window, computed);

        tracing::debug!("Showing {} authenticators", snapshot.items.len());
        self.items = snapshot.items;
    }

    /// Starts a clock sample. Returns the local call time to hand back to
    /// [`SyncEngine::finish_sync`], or `None` while a sample is running.
    pub fn begin_sync(&mut self) -> Option<i64> {
        self.offset.begin_sample().then(|| self.clock.now())
    }

    pub fn finish_sync(&mut self, local_at_call: i64, result: Result<i64, ApiError>) {
        self.offset.record(local_at_call, result);
    }

    /// Tears every activity down. In-flight fetches are forgotten, the latch
    /// is released.
    pub fn cancel_all(&mut self) {
        self.refresh.cancel();
        self.offset.cancel();
        self.trigger.reset();
    }

    pub fn items(&self) -> &[Authenticator] {
        &self.items
    }

    /// Seconds left for an item, `1..=window`
    pub fn countdown(&self, id: AuthenticatorId) -> Option<u64> {
        self.countdown.get(id)
    }

    pub fn is_loading(&self) -> bool {
        self.refresh.is_loading()
    }

    pub fn is_auto_updating(&self) -> bool {
        self.refresh.is_auto_updating()
    }

    #[cfg(test)]
    pub fn offset(&self) -> i64 {
        self.offset.seconds()
    }

    #[cfg(test)]
    pub fn latch(&self) -> super::trigger::LatchState {
        self.trigger.state()
    }

    pub fn window(&self) -> Window {
        self.window
    }
}
