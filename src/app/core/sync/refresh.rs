// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

/// Why a refresh is happening, which decides what the user gets to see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshMode {
    /// Asked for by the user, a loading indicator is shown while it runs
    Manual,
    /// Started by a window boundary, the display updates in place
    Automatic,
}

impl fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshMode::Manual => write!(f, "manual"),
            RefreshMode::Automatic => write!(f, "automatic"),
        }
    }
}

/// Identifies one started refresh; a completion must present the ticket of
/// the refresh currently in flight to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshTicket {
    id: u64,
    mode: RefreshMode,
    started_at: i64,
}

impl RefreshTicket {
    pub fn mode(&self) -> RefreshMode {
        self.mode
    }

    /// Local time the refresh was started at
    pub fn started_at(&self) -> i64 {
        self.started_at
    }
}

/// Lets at most one refresh fetch run at a time.
///
/// While one is in flight a manual request is dropped, the running fetch
/// already answers it. An automatic request is parked in a single slot and
/// started as soon as the running fetch completes, so a boundary is never
/// answered by a fetch that began before it.
#[derive(Debug, Clone, Default)]
pub struct RefreshCoordinator {
    next_id: u64,
    in_flight: Option<RefreshTicket>,
    automatic_pending: bool,
}

impl RefreshCoordinator {
    /// Single entry point for every refresh. Returns the ticket when the
    /// caller should go and fetch now.
    pub fn begin(&mut self, mode: RefreshMode, now: i64) -> Option<RefreshTicket> {
        if let Some(running) = self.in_flight {
            match mode {
                RefreshMode::Manual => {
                    tracing::debug!("Manual refresh ignored, {} refresh in flight", running.mode);
                }
                RefreshMode::Automatic => {
                    tracing::debug!("Automatic refresh queued behind {} refresh", running.mode);
                    self.automatic_pending = true;
                }
            }
            return None;
        }

        self.next_id += 1;
        let ticket = RefreshTicket {
            id: self.next_id,
            mode,
            started_at: now,
        };
        self.in_flight = Some(ticket);

        Some(ticket)
    }

    /// Releases the in-flight slot. Returns `false` for a ticket that is not
    /// the one in flight, its result must be dropped.
    pub fn finish(&mut self, ticket: RefreshTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Starts the parked automatic refresh, if any
    pub fn start_pending(&mut self, now: i64) -> Option<RefreshTicket> {
        if !self.automatic_pending || self.in_flight.is_some() {
            return None;
        }
        self.automatic_pending = false;
        self.begin(RefreshMode::Automatic, now)
    }

    #[cfg(test)]
    pub fn in_flight(&self) -> Option<RefreshTicket> {
        self.in_flight
    }

    #[cfg(test)]
    pub fn has_pending(&self) -> bool {
        self.automatic_pending
    }

    /// Only a manual refresh surfaces the blocking loading state
    pub fn is_loading(&self) -> bool {
        self.in_flight
            .is_some_and(|ticket| ticket.mode == RefreshMode::Manual)
    }

    pub fn is_auto_updating(&self) -> bool {
        self.in_flight
            .is_some_and(|ticket| ticket.mode == RefreshMode::Automatic)
    }

    /// Drops the in-flight and parked refreshes
    pub fn cancel(&mut self) {
        self.in_flight = None;
        self.automatic_pending = false;
    }
}
