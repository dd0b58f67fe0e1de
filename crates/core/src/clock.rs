//! Business-day clock.
//!
//! The kiosk runs on a single campus, so "today" is the calendar date in one
//! fixed UTC offset rather than the host's local zone.

use chrono::{FixedOffset, NaiveDate, Offset, Utc};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default business offset: UTC-4 (Bolivia, no DST).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -4;

/// Source of the current business-day timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock shifted into a fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build from a whole-hour offset, rejecting values outside +-23h.
    pub fn from_offset_hours(hours: i32) -> Result<Self, CoreError> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| CoreError::Validation(format!("UTC offset {hours}h is out of range")))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        let offset = FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600)
            .unwrap_or_else(|| Utc.fix());
        Self::new(offset)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().with_timezone(&self.offset)
    }
}

/// A clock pinned to one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Calendar day of `ts` in its own offset.
pub fn day_key(ts: &Timestamp) -> NaiveDate {
    ts.date_naive()
}

/// Whether two timestamps fall on the same business day.
pub fn same_day(a: &Timestamp, b: &Timestamp) -> bool {
    day_key(a) == day_key(b)
}
