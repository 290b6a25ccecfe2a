//! Encoded departure times and time-of-day periods.
//!
//! Survey times are encoded as `HH * 100 + MM`, with `HH` running up to 29 so
//! that trips after midnight stay on the survey day (`2530` is 01:30 the
//! following morning).

use serde::{Deserialize, Serialize};

use crate::error::MappingError;

/// A validated `HHMM` departure time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DepartTime(u32);

impl DepartTime {
    pub const MAX_ENCODED: i64 = 2959;

    /// Validates a raw encoded value; anything outside `0..=2959` or with a
    /// minute component above 59 is treated as missing.
    pub fn new(raw: i64) -> Option<Self> {
        if !(0..=Self::MAX_ENCODED).contains(&raw) {
            return None;
        }
        if raw % 100 > 59 {
            return None;
        }
        u32::try_from(raw).ok().map(Self)
    }

    pub fn from_code(raw: Option<i64>) -> Option<Self> {
        raw.and_then(Self::new)
    }

    pub fn encoded(self) -> u32 {
        self.0
    }

    /// Hour as written in the encoding, `0..=29`.
    pub fn encoded_hour(self) -> u32 {
        self.0 / 100
    }

    pub fn minute(self) -> u32 {
        self.0 % 100
    }

    /// Wall-clock hour, `0..=23`; encoded hours 24..29 fold back to 0..5.
    pub fn clock_hour(self) -> u32 {
        if self.0 >= 2400 {
            (self.0 - 2400) / 100
        } else {
            self.0 / 100
        }
    }
}

/// A named half-open interval `[start, end)` in encoded `HHMM` units.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimePeriod {
    pub name: String,
    pub start: u32,
    pub end: u32,
}

impl TimePeriod {
    pub fn new(name: &str, start: u32, end: u32) -> Self {
        Self {
            name: name.to_string(),
            start,
            end,
        }
    }

    pub fn contains(&self, time: DepartTime) -> bool {
        (self.start..self.end).contains(&time.encoded())
    }
}

/// Ordered, non-overlapping set of time periods.
#[derive(Debug, Clone)]
pub struct TimePeriods {
    periods: Vec<TimePeriod>,
}

impl TimePeriods {
    /// Builds the period table, rejecting empty intervals and overlaps.
    pub fn new(periods: impl IntoIterator<Item = TimePeriod>) -> Result<Self, MappingError> {
        let periods: Vec<TimePeriod> = periods.into_iter().collect();

        for (i, p) in periods.iter().enumerate() {
            if p.start >= p.end {
                return Err(MappingError::EmptyPeriod {
                    name: p.name.clone(),
                    start: p.start,
                    end: p.end,
                });
            }
            for q in &periods[..i] {
                if p.start < q.end && q.start < p.end {
                    return Err(MappingError::OverlappingPeriods {
                        first: q.name.clone(),
                        second: p.name.clone(),
                    });
                }
            }
        }

        Ok(Self { periods })
    }

    /// The period containing `time`. `None` means unclassified: either the
    /// time was missing/invalid or it falls between declared periods.
    pub fn classify(&self, time: Option<DepartTime>) -> Option<&str> {
        let time = time?;
        self.periods
            .iter()
            .find(|p| p.contains(time))
            .map(|p| p.name.as_str())
    }

    pub fn names(&self) -> Vec<&str> {
        self.periods.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn periods(&self) -> &[TimePeriod] {
        &self.periods
    }
}
