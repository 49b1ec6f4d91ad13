//! Departure date/time handling.
//!
//! Listings store a `YYYY-MM-DD` date (absent means "today") and an `HH:MM`
//! time as plain text, interpreted in a single configured UTC offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};

use crate::{CoreError, CoreResult};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Invalid departure date: {0}")]
    InvalidDate(String),
    #[error("Invalid departure time: {0}")]
    InvalidTime(String),
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    let trimmed = raw.trim();
    // Tolerate full ISO timestamps and keep only the calendar date.
    let date_part = trimmed.split('T').next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| ScheduleError::InvalidDate(raw.to_string()))
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, ScheduleError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ScheduleError::InvalidTime(raw.to_string()))
}

/// Combine a stored date (or `today`) with a stored time.
pub fn departure_local(date: Option<&str>, time: &str, today: NaiveDate) -> Result<NaiveDateTime, ScheduleError> {
    let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_date(raw)?,
        None => today,
    };
    Ok(date.and_time(parse_time(time)?))
}

/// Resolves stored schedules to instants for a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct DepartureResolver {
    offset: FixedOffset,
}

impl DepartureResolver {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn from_offset_minutes(minutes: i32) -> CoreResult<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| CoreError::ValidationError(format!("UTC offset out of range: {} minutes", minutes)))
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Calendar date at `now` in the configured offset.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    pub fn departure(&self, date: Option<&str>, time: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let local = departure_local(date, time, self.today(now))?;
        // A fixed offset never yields an ambiguous or missing local time.
        let resolved = self
            .offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| ScheduleError::InvalidTime(time.to_string()))?;
        Ok(resolved.with_timezone(&Utc))
    }

    /// Fail-open check used by the sweeper: malformed schedules never expire.
    pub fn departs_by(&self, date: Option<&str>, time: &str, now: DateTime<Utc>, cutoff: DateTime<Utc>) -> bool {
        match self.departure(date, time, now) {
            Ok(departure) => departure <= cutoff,
            Err(e) => {
                tracing::warn!("Unparseable departure ({:?} {:?}), treating as not expired: {}", date, time, e);
                false
            }
        }
    }
}

impl Default for DepartureResolver {
    fn default() -> Self {
        Self::utc()
    }
}

/// Reject schedules that could never be resolved.
pub fn validate(date: Option<&str>, time: &str) -> CoreResult<()> {
    if let Some(raw) = date.filter(|d| !d.trim().is_empty()) {
        parse_date(raw).map_err(|e| CoreError::ValidationError(e.to_string()))?;
    }
    parse_time(time).map_err(|e| CoreError::ValidationError(e.to_string()))?;
    Ok(())
}
