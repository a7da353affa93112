//! Account lockout policy.
//!
//! Pure state machine over [`LockoutState`]. Two states: `Normal` (no lock or
//! an expired one) and `Locked` (`now < locked_until`). The policy never reads
//! the clock; `now` is always passed in.

use chrono::{DateTime, TimeDelta, Utc};

use crate::domain::entity::LockoutState;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCK_DURATION: TimeDelta = TimeDelta::minutes(30);
pub const DEFAULT_STALE_WINDOW: TimeDelta = TimeDelta::hours(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lock
    pub max_attempts: u32,
    pub lock_duration: TimeDelta,
    /// A failure older than this starts a fresh run of attempts
    pub stale_window: TimeDelta,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            lock_duration: DEFAULT_LOCK_DURATION,
            stale_window: DEFAULT_STALE_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStatus {
    Normal,
    Locked { until: DateTime<Utc>, remaining: TimeDelta },
}

impl LockStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockStatus::Locked { .. })
    }

    /// Remaining lock time in whole minutes, rounded up so a lock is never
    /// reported as "0 minutes".
    pub fn remaining_minutes(&self) -> i64 {
        match self {
            LockStatus::Normal => 0,
            LockStatus::Locked { remaining, .. } => {
                let secs = remaining.num_seconds().max(0);
                (secs + 59) / 60
            }
        }
    }
}

/// What changed when checking the lock, so callers know whether to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockCheck {
    pub status: LockStatus,
    /// True when an expired lock was cleared by this check
    pub expired_lock_cleared: bool,
}

impl LockoutPolicy {
    /// Report the lock state at `now`. An expired lock is cleared on the spot
    /// together with the attempt counter; calling again is a no-op.
    pub fn check_lock(&self, state: &mut LockoutState, now: DateTime<Utc>) -> LockCheck {
        match state.locked_until {
            Some(until) if now < until => LockCheck {
                status: LockStatus::Locked {
                    until,
                    remaining: until - now,
                },
                expired_lock_cleared: false,
            },
            Some(_) => {
                state.locked_until = None;
                state.failed_attempts = 0;
                LockCheck {
                    status: LockStatus::Normal,
                    expired_lock_cleared: true,
                }
            }
            None => LockCheck {
                status: LockStatus::Normal,
                expired_lock_cleared: false,
            },
        }
    }

    /// Count one failed attempt at `now`.
    ///
    /// A lock is only set when the threshold is crossed while not already
    /// locked; failures arriving during an active lock do not extend it.
    pub fn record_failure(&self, state: &mut LockoutState, now: DateTime<Utc>) -> LockStatus {
        if let Some(last) = state.last_failed_attempt {
            if now - last > self.stale_window {
                state.failed_attempts = 0;
            }
        }

        state.failed_attempts = state.failed_attempts.saturating_add(1);
        state.last_failed_attempt = Some(now);

        let already_locked = state.locked_until.is_some_and(|until| now < until);
        if !already_locked && state.failed_attempts >= self.max_attempts {
            state.locked_until = Some(now + self.lock_duration);
        }

        match state.locked_until {
            Some(until) if now < until => LockStatus::Locked {
                until,
                remaining: until - now,
            },
            _ => LockStatus::Normal,
        }
    }

    pub fn record_success(&self, state: &mut LockoutState) {
        *state = LockoutState::cleared();
    }
}
