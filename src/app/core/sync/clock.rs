// SPDX-License-Identifier: GPL-3.0-only

//! Local clock access and the estimate of how far it is from the server clock.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::core::ApiError;

/// Source of local wall-clock time, in whole unix seconds
pub trait Clock {
    fn now(&self) -> i64;
}

/// The operating system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

/// Virtual clock for driving the engine without sleeping
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ManualClock(std::sync::Arc<std::sync::atomic::AtomicI64>);

#[cfg(test)]
impl ManualClock {
    pub fn at(now: i64) -> Self {
        Self(std::sync::Arc::new(std::sync::atomic::AtomicI64::new(now)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// Best-effort correction from local time to server time.
///
/// Starts at zero and only ever changes on a successful sample; a failed
/// sample keeps the previous value.
#[derive(Debug, Clone, Default)]
pub struct ClockOffset {
    seconds: i64,
    sampling: bool,
}

impl ClockOffset {
    /// Current offset, `server_time - local_time`
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Marks a sample as in flight. Returns `false` when one already is,
    /// so a slow server never gets a second request stacked on top.
    pub fn begin_sample(&mut self) -> bool {
        if self.sampling {
            return false;
        }
        self.sampling = true;
        true
    }

    #[cfg(test)]
    pub fn is_sampling(&self) -> bool {
        self.sampling
    }

    /// Completes the sample started with [`ClockOffset::begin_sample`]
    pub fn record(&mut self, local_at_call: i64, result: Result<i64, ApiError>) {
        self.sampling = false;

        match result {
            Ok(server_time) => self.observe(local_at_call, server_time),
            Err(err) => {
                tracing::warn!("Clock sync failed, keeping offset {}s: {}", self.seconds, err);
            }
        }
    }

    /// Takes a server clock reading that arrived by any route (time endpoint or listing)
    pub fn observe(&mut self, local_at_call: i64, server_time: i64) {
        let offset = server_time.saturating_sub(local_at_call);
        if offset != self.seconds {
            tracing::debug!("Clock offset {}s -> {}s", self.seconds, offset);
        }
        self.seconds = offset;
    }

    /// Forgets the in-flight sample, its task has been aborted
    pub fn cancel(&mut self) {
        self.sampling = false;
    }
}
