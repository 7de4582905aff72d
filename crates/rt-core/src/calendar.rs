//! Disruption-day calendar.
//!
//! Recurring closures (weekly street markets) happen on one fixed weekday.
//! The model sees this as a binary feature: `1` on the market day, `0`
//! otherwise.

use std::fmt;

use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::CoreError;

// ── DayKind ───────────────────────────────────────────────────────────────────

/// Whether a trip happens on a regular day or on a disruption day.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DayKind {
    #[default]
    Normal,
    Disruption,
}

impl DayKind {
    #[inline]
    pub fn from_bool(disrupted: bool) -> Self {
        if disrupted { DayKind::Disruption } else { DayKind::Normal }
    }

    #[inline]
    pub fn is_disruption(self) -> bool {
        self == DayKind::Disruption
    }

    /// Wire / CSV flag: `0` or `1`.
    #[inline]
    pub fn flag(self) -> u8 {
        match self {
            DayKind::Normal => 0,
            DayKind::Disruption => 1,
        }
    }

    /// Numeric model feature.
    #[inline]
    pub fn feature(self) -> f64 {
        self.flag() as f64
    }
}

impl TryFrom<u8> for DayKind {
    type Error = CoreError;

    fn try_from(flag: u8) -> Result<Self, Self::Error> {
        match flag {
            0 => Ok(DayKind::Normal),
            1 => Ok(DayKind::Disruption),
            other => Err(CoreError::InvalidDayFlag(other)),
        }
    }
}

impl From<DayKind> for u8 {
    fn from(day: DayKind) -> u8 {
        day.flag()
    }
}

impl fmt::Display for DayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayKind::Normal => f.write_str("normal"),
            DayKind::Disruption => f.write_str("disruption"),
        }
    }
}

// ── DisruptionCalendar ────────────────────────────────────────────────────────

/// Maps calendar dates to a [`DayKind`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DisruptionCalendar {
    pub weekday: Weekday,
}

impl DisruptionCalendar {
    pub fn new(weekday: Weekday) -> Self {
        Self { weekday }
    }

    pub fn day_kind(&self, date: NaiveDate) -> DayKind {
        DayKind::from_bool(date.weekday() == self.weekday)
    }

    /// Day kind for the current local date.
    pub fn today(&self) -> DayKind {
        self.day_kind(Local::now().date_naive())
    }
}

impl Default for DisruptionCalendar {
    /// Markets are held on Thursdays.
    fn default() -> Self {
        Self { weekday: Weekday::Thu }
    }
}
