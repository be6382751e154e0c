//! Tick-count timestamps
//!
//! Instants travel on the wire as a signed count of 100-nanosecond ticks since
//! the Unix epoch. Calendar conversion happens only at the edges (display,
//! configuration, the inspector CLI); inside the protocol a `Ticks` is an
//! ordered integer and nothing more.

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Number of ticks in one millisecond
pub const TICKS_PER_MILLISECOND: i64 = 10_000;

/// Number of ticks in one second
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// A point in time expressed as 100ns ticks since 1970-01-01T00:00:00Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Ticks(pub i64);

impl Ticks {
    /// The Unix epoch
    pub const EPOCH: Self = Self(0);

    /// Earliest representable instant
    pub const MIN: Self = Self(i64::MIN);

    /// Latest representable instant
    pub const MAX: Self = Self(i64::MAX);

    /// Create from a raw tick count
    #[inline(always)]
    pub const fn new(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Convert from a calendar instant, saturating outside the representable range
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        let seconds = instant.timestamp();
        let sub_ticks = i64::from(instant.timestamp_subsec_nanos() / 100);
        let ticks = seconds
            .checked_mul(TICKS_PER_SECOND)
            .and_then(|t| t.checked_add(sub_ticks));
        match ticks {
            Some(t) => Self(t),
            None if seconds < 0 => Self::MIN,
            None => Self::MAX,
        }
    }

    /// Convert to a calendar instant; `None` when outside chrono's range
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let seconds = self.0.div_euclid(TICKS_PER_SECOND);
        let nanos = (self.0.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
        Utc.timestamp_opt(seconds, nanos).single()
    }

    /// Raw tick count
    #[inline(always)]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Add a span of ticks, saturating at the bounds
    pub fn saturating_add(self, span: i64) -> Self {
        Self(self.0.saturating_add(span))
    }

    /// Ticks elapsed from `earlier` to `self`
    pub fn since(self, earlier: Ticks) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(instant) => write!(f, "{}", instant.to_rfc3339()),
            None => write!(f, "ticks:{}", self.0),
        }
    }
}

impl From<DateTime<Utc>> for Ticks {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::from_datetime(instant)
    }
}
