//! src/release/clock.rs
//! Time source for the release timestamp.
//!
//! The packager never calls the system clock directly; it asks a `Clock`, so
//! tests can pin the timestamp and exercise the clock failure path.

use std::fmt;

use chrono::{Datelike, Local, Timelike};

use crate::headers::ReleaseTimestamp;

pub trait Clock {
    /// Current local wall-clock time, minute resolution.
    fn now(&self) -> Result<ReleaseTimestamp, ClockError>;
}

/// Local time from the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Result<ReleaseTimestamp, ClockError> {
        timestamp_from(&Local::now())
    }
}

/// Always returns the same timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub ReleaseTimestamp);

impl Clock for FixedClock {
    fn now(&self) -> Result<ReleaseTimestamp, ClockError> {
        Ok(self.0)
    }
}

/// Convert any chrono date-time into header fields.
/// The year must fit the 16-bit header field.
pub fn timestamp_from<T: Datelike + Timelike>(t: &T) -> Result<ReleaseTimestamp, ClockError> {
    let year = u16::try_from(t.year()).map_err(|_| ClockError::YearOutOfRange { year: t.year() })?;

    // chrono guarantees these ranges, so the narrowing casts are lossless.
    Ok(ReleaseTimestamp {
        year,
        month: t.month() as u8,
        day: t.day() as u8,
        hour: t.hour() as u8,
        minute: t.minute() as u8,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    /// Time source could not be read.
    Unavailable(String),

    /// Year does not fit the u16 header field.
    YearOutOfRange { year: i32 },
}

impl fmt::Display for ClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockError::Unavailable(msg) => write!(f, "time source unavailable: {}", msg),
            ClockError::YearOutOfRange { year } => write!(f, "year {} does not fit the header", year),
        }
    }
}

impl std::error::Error for ClockError {}
