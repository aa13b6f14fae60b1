//! # Refresh Policy
//!
//! Decides which refresh mode each update should use.
//!
//! ## Rules
//!
//! | Update | Condition | Mode |
//! |--------|-----------|------|
//! | Dashboard | nothing changed | skipped |
//! | Dashboard | only weather changed | Fast |
//! | Dashboard | anything else changed | Full |
//! | Clock | fewer than `max_partial_updates` partials since last full | Partial |
//! | Clock | partial budget used up | Full |
//! | Any | no full refresh yet, or last one older than `max_full_interval` | Full |
//!
//! Partial updates leave faint ghosting that accumulates; a periodic full
//! refresh wipes it. Only a full refresh resets the counters.

use bitflags::bitflags;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::panel::RefreshMode;

/// Default number of partial updates between full refreshes.
pub const DEFAULT_MAX_PARTIAL_UPDATES: u32 = 10;

/// Default upper bound on the time between full refreshes, in hours.
pub const DEFAULT_MAX_FULL_INTERVAL_HOURS: i64 = 24;

bitflags! {
    /// Which dashboard sections changed since the last presentation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContentChanges: u8 {
        const WEATHER  = 0b0000_0001;
        const MENU     = 0b0000_0010;
        const CALENDAR = 0b0000_0100;
    }
}

/// Tunables for [`RefreshTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub max_partial_updates: u32,
    pub max_full_interval: TimeDelta,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            max_partial_updates: DEFAULT_MAX_PARTIAL_UPDATES,
            max_full_interval: TimeDelta::hours(DEFAULT_MAX_FULL_INTERVAL_HOURS),
        }
    }
}

/// Refresh history plus the policy that interprets it.
#[derive(Debug, Clone)]
pub struct RefreshTracker {
    policy: RefreshPolicy,
    last_full: Option<DateTime<Utc>>,
    partials_since_full: u32,
}

impl RefreshTracker {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            policy,
            last_full: None,
            partials_since_full: 0,
        }
    }

    pub fn policy(&self) -> &RefreshPolicy {
        &self.policy
    }

    pub fn last_full(&self) -> Option<DateTime<Utc>> {
        self.last_full
    }

    pub fn partials_since_full(&self) -> u32 {
        self.partials_since_full
    }

    /// Mode for a dashboard regeneration, or `None` when nothing changed.
    pub fn dashboard_mode(&self, changes: ContentChanges, now: DateTime<Utc>) -> Option<RefreshMode> {
        if changes.is_empty() {
            return None;
        }
        if self.full_due(now) {
            return Some(RefreshMode::Full);
        }
        if changes == ContentChanges::WEATHER {
            Some(RefreshMode::Fast)
        } else {
            Some(RefreshMode::Full)
        }
    }

    /// Mode for a clock update.
    pub fn clock_mode(&self, now: DateTime<Utc>) -> RefreshMode {
        if self.full_due(now) || self.partials_since_full >= self.policy.max_partial_updates {
            RefreshMode::Full
        } else {
            RefreshMode::Partial
        }
    }

    /// Note a successful refresh.
    pub fn record(&mut self, mode: RefreshMode, now: DateTime<Utc>) {
        match mode {
            RefreshMode::Full => {
                self.last_full = Some(now);
                self.partials_since_full = 0;
            }
            RefreshMode::Partial => self.partials_since_full += 1,
            RefreshMode::Fast => {}
        }
        debug!(
            %mode,
            partials_since_full = self.partials_since_full,
            "Refresh recorded"
        );
    }

    /// Forget history so the next update is a full refresh.
    pub fn reset(&mut self) {
        self.last_full = None;
        self.partials_since_full = 0;
    }

    fn full_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_full {
            None => true,
            Some(last) => now - last >= self.policy.max_full_interval,
        }
    }
}
