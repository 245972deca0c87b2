//! Call-budget accounting for one GitHub instance.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::host::RateLimitSnapshot;

#[derive(Debug, Default)]
struct MonitorState {
    known: bool,
    limit: usize,
    remaining: usize,
    reset_at: Option<DateTime<Utc>>,
}

/// Tracks the host's remaining call budget as responses come back.
///
/// Both enumerator producers issue calls through one shared client, so the
/// state lives behind a mutex; the scheduler and producers only read it.
#[derive(Debug, Default)]
pub struct RateLimitMonitor {
    state: Mutex<MonitorState>,
}

impl RateLimitMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the budget reported by the latest API response.
    pub fn update(&self, limit: usize, remaining: usize, reset_at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.known = true;
        state.limit = limit;
        state.remaining = remaining;
        state.reset_at = Some(reset_at);
    }

    /// Remaining budget and time to reset, once any response has been seen.
    pub fn snapshot(&self) -> Option<RateLimitSnapshot> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.known {
            return None;
        }
        Some(RateLimitSnapshot {
            remaining: state.remaining,
            reset_in: state.reset_at.map(duration_until).unwrap_or_default(),
        })
    }

    /// How long a background operation of the given cost should pause
    /// before its next call.
    ///
    /// Zero while more than a tenth of the window's budget would remain
    /// after the call; otherwise the time left in the window is spread
    /// evenly over the calls the budget still affords.
    pub fn recommended_wait(&self, cost: usize) -> Duration {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.known {
            return Duration::ZERO;
        }
        let after = state.remaining.saturating_sub(cost);
        if after > state.limit / 10 {
            return Duration::ZERO;
        }
        let reset_in = state.reset_at.map(duration_until).unwrap_or_default();
        if after == 0 {
            return reset_in;
        }
        let calls_left = (after / cost.max(1)).max(1) as u32;
        reset_in / calls_left
    }
}

fn duration_until(at: DateTime<Utc>) -> Duration {
    (at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
}
