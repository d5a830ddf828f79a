//! Free-case cooldown. Only the last claim time is stored; readiness is
//! derived from it on every read.

use crate::error::Rejection;
use chrono::{
    DateTime,
    TimeDelta,
    Utc,
};
use serde::Serialize;
use std::sync::{
    Arc,
    Mutex,
};

pub const DEFAULT_FREE_CASE_WINDOW_SECS: u64 = 300;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeCaseStatus {
    pub ready: bool,
    pub remaining_ms: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreeCaseCooldown {
    window: TimeDelta,
}

impl FreeCaseCooldown {
    pub fn new(window: TimeDelta) -> Self {
        Self { window }
    }

    pub fn window(&self) -> TimeDelta {
        self.window
    }

    /// `None` when the deadline lies past the last representable instant.
    pub fn deadline(&self, last_claim: DateTime<Utc>) -> Option<DateTime<Utc>> {
        last_claim.checked_add_signed(self.window)
    }

    pub fn status(
        &self,
        last_claim: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> FreeCaseStatus {
        let Some(last_claim) = last_claim else {
            return FreeCaseStatus {
                ready: true,
                remaining_ms: 0,
            };
        };
        // a claim stamped in the future (clock moved back) waits at most one window
        let remaining = match self.deadline(last_claim) {
            Some(deadline) => (deadline - now).min(self.window),
            None => self.window,
        };
        let remaining_ms = u64::try_from(remaining.num_milliseconds()).unwrap_or(0);
        FreeCaseStatus {
            ready: remaining_ms == 0,
            remaining_ms,
        }
    }

    pub fn ensure_ready(
        &self,
        last_claim: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), Rejection> {
        let status = self.status(last_claim, now);
        if status.ready {
            Ok(())
        } else {
            Err(Rejection::CooldownActive {
                remaining_ms: status.remaining_ms,
            })
        }
    }
}

impl Default for FreeCaseCooldown {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_FREE_CASE_WINDOW_SECS as i64))
    }
}
