//! ISO-8601 calendar values with optional time zone offsets
//!
//! XACML date, dateTime and time literals may or may not carry a zone, so
//! each type keeps the local value together with an optional
//! [`TimeZoneOffset`]. Comparison normalizes to UTC, treating a missing zone
//! as UTC.

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::duration::Iso8601Duration;
use crate::error::DataTypeError;

const MAX_OFFSET_MINUTES: i32 = 24 * 60;
const MAX_NORMALIZED_OFFSET_MINUTES: i32 = 12 * 60;

/// Time zone offset in minutes east of UTC.
///
/// Offsets whose magnitude is above twelve hours (up to twenty-four) are
/// folded into the equivalent offset on the other side of the date line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeZoneOffset {
    minutes: i32,
}

impl TimeZoneOffset {
    pub const UTC: TimeZoneOffset = TimeZoneOffset { minutes: 0 };

    pub fn new(minutes: i32) -> Result<Self, DataTypeError> {
        let magnitude = minutes.abs();
        if magnitude > MAX_OFFSET_MINUTES {
            return Err(DataTypeError::Other(format!(
                "Invalid time zone offset {} minutes",
                minutes
            )));
        }
        let minutes = if magnitude > MAX_NORMALIZED_OFFSET_MINUTES {
            if minutes < 0 {
                MAX_OFFSET_MINUTES - magnitude
            } else {
                -(MAX_OFFSET_MINUTES - magnitude)
            }
        } else {
            minutes
        };
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> i32 {
        self.minutes
    }

    fn delta(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.minutes) * 60)
    }
}

impl FromStr for TimeZoneOffset {
    type Err = DataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DataTypeError::Other("Zero length time zone string".to_string()));
        }
        if s == "Z" {
            return Ok(Self::UTC);
        }

        let invalid = || DataTypeError::Other(format!("Invalid time zone \"{}\"", s));
        let (sign, rest) = if let Some(rest) = s.strip_prefix('+') {
            (1, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (-1, rest)
        } else {
            return Err(invalid());
        };
        let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
        let two_digits = |field: &str| field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hours) || !two_digits(minutes) {
            return Err(invalid());
        }
        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if !(0..=24).contains(&hours) || !(0..60).contains(&minutes) {
            return Err(invalid());
        }

        Self::new(sign * (hours * 60 + minutes))
    }
}

impl fmt::Display for TimeZoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minutes == 0 {
            return f.write_str("Z");
        }
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let magnitude = self.minutes.abs();
        write!(f, "{}{:02}:{:02}", sign, magnitude / 60, magnitude % 60)
    }
}

/// Splits a trailing zone designator off a lexical value. The zone is only
/// searched for at or after `min_index`, so date separators are never taken
/// for a negative offset.
fn split_zone(s: &str, min_index: usize) -> Result<(&str, Option<TimeZoneOffset>), DataTypeError> {
    if let Some(main) = s.strip_suffix('Z') {
        return Ok((main, Some(TimeZoneOffset::UTC)));
    }
    if s.len() <= min_index {
        return Ok((s, None));
    }
    let tail = s
        .get(min_index..)
        .ok_or_else(|| DataTypeError::Other(format!("Invalid character in \"{}\"", s)))?;
    match tail.rfind(|c: char| c == '+' || c == '-') {
        Some(pos) => {
            let (main, zone) = s.split_at(min_index + pos);
            Ok((main, Some(zone.parse()?)))
        }
        None => Ok((s, None)),
    }
}

fn fmt_zone(f: &mut fmt::Formatter<'_>, zone: &Option<TimeZoneOffset>) -> fmt::Result {
    match zone {
        Some(zone) => write!(f, "{}", zone),
        None => Ok(()),
    }
}

fn conversion_error(data_type: &'static str, value: &str, source: chrono::ParseError) -> DataTypeError {
    DataTypeError::Conversion {
        data_type,
        value: value.to_string(),
        source: Some(Box::new(source)),
    }
}

/// Shifts a local timestamp by a duration: months first, then the
/// day-time fields. `None` on overflow.
fn shift(local: NaiveDateTime, duration: &Iso8601Duration, subtract: bool) -> Option<NaiveDateTime> {
    let backwards = duration.negative != subtract;
    let months = Months::new(duration.total_months()?);
    let delta = duration.day_time_delta()?;

    if backwards {
        local.checked_sub_months(months)?.checked_sub_signed(delta)
    } else {
        local.checked_add_months(months)?.checked_add_signed(delta)
    }
}

/// Values that support adding and subtracting ISO-8601 durations
pub trait DateTimeArithmetic: Sized {
    fn add_duration(&self, duration: &Iso8601Duration) -> Option<Self>;
    fn subtract_duration(&self, duration: &Iso8601Duration) -> Option<Self>;
}

/// `xs:dateTime`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct XacmlDateTime {
    pub local: NaiveDateTime,
    pub zone: Option<TimeZoneOffset>,
}

impl XacmlDateTime {
    pub fn new(local: NaiveDateTime, zone: Option<TimeZoneOffset>) -> Self {
        Self { local, zone }
    }

    pub fn utc(local: NaiveDateTime) -> Self {
        Self::new(local, Some(TimeZoneOffset::UTC))
    }

    /// The instant in UTC
    pub fn instant(&self) -> NaiveDateTime {
        let offset = self.zone.unwrap_or_default().delta();
        self.local.checked_sub_signed(offset).unwrap_or(self.local)
    }
}

impl DateTimeArithmetic for XacmlDateTime {
    fn add_duration(&self, duration: &Iso8601Duration) -> Option<Self> {
        shift(self.local, duration, false).map(|local| Self::new(local, self.zone))
    }

    fn subtract_duration(&self, duration: &Iso8601Duration) -> Option<Self> {
        shift(self.local, duration, true).map(|local| Self::new(local, self.zone))
    }
}

impl FromStr for XacmlDateTime {
    type Err = DataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let min_index = s.find('T').ok_or_else(|| {
            DataTypeError::Other(format!("Invalid dateTime \"{}\": missing 'T'", s))
        })?;
        let (main, zone) = split_zone(s, min_index)?;
        let local = NaiveDateTime::parse_from_str(main, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| conversion_error("dateTime", s, e))?;
        Ok(Self { local, zone })
    }
}

impl fmt::Display for XacmlDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format("%Y-%m-%dT%H:%M:%S%.f"))?;
        fmt_zone(f, &self.zone)
    }
}

impl PartialEq for XacmlDateTime {
    fn eq(&self, other: &Self) -> bool {
        self.instant() == other.instant()
    }
}

impl PartialOrd for XacmlDateTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.instant().partial_cmp(&other.instant())
    }
}

/// `xs:date`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct XacmlDate {
    pub date: NaiveDate,
    pub zone: Option<TimeZoneOffset>,
}

impl XacmlDate {
    pub fn new(date: NaiveDate, zone: Option<TimeZoneOffset>) -> Self {
        Self { date, zone }
    }

    /// Midnight at the start of this date, in UTC
    pub fn instant(&self) -> NaiveDateTime {
        XacmlDateTime::new(self.date.and_time(NaiveTime::MIN), self.zone).instant()
    }
}

impl DateTimeArithmetic for XacmlDate {
    fn add_duration(&self, duration: &Iso8601Duration) -> Option<Self> {
        shift(self.date.and_time(NaiveTime::MIN), duration, false)
            .map(|local| Self::new(local.date(), self.zone))
    }

    fn subtract_duration(&self, duration: &Iso8601Duration) -> Option<Self> {
        shift(self.date.and_time(NaiveTime::MIN), duration, true)
            .map(|local| Self::new(local.date(), self.zone))
    }
}

impl FromStr for XacmlDate {
    type Err = DataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // "-MM-DD" follows the year, whatever its width
        let year_end = s
            .get(1..)
            .and_then(|rest| rest.find('-'))
            .map(|i| i + 1)
            .ok_or_else(|| DataTypeError::Other(format!("Invalid date \"{}\"", s)))?;
        let (main, zone) = split_zone(s, year_end + 6)?;
        let date = NaiveDate::parse_from_str(main, "%Y-%m-%d").map_err(|e| conversion_error("date", s, e))?;
        Ok(Self { date, zone })
    }
}

impl fmt::Display for XacmlDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))?;
        fmt_zone(f, &self.zone)
    }
}

impl PartialEq for XacmlDate {
    fn eq(&self, other: &Self) -> bool {
        self.instant() == other.instant()
    }
}

impl PartialOrd for XacmlDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.instant().partial_cmp(&other.instant())
    }
}

/// `xs:time`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct XacmlTime {
    pub time: NaiveTime,
    pub zone: Option<TimeZoneOffset>,
}

impl XacmlTime {
    pub fn new(time: NaiveTime, zone: Option<TimeZoneOffset>) -> Self {
        Self { time, zone }
    }

    /// Time of day in UTC, wrapping around midnight
    pub fn normalized(&self) -> NaiveTime {
        let (time, _) = self
            .time
            .overflowing_sub_signed(self.zone.unwrap_or_default().delta());
        time
    }
}

impl FromStr for XacmlTime {
    type Err = DataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (main, zone) = split_zone(s, 8)?;
        let time = NaiveTime::parse_from_str(main, "%H:%M:%S%.f").map_err(|e| conversion_error("time", s, e))?;
        Ok(Self { time, zone })
    }
}

impl fmt::Display for XacmlTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%H:%M:%S%.f"))?;
        fmt_zone(f, &self.zone)
    }
}

impl PartialEq for XacmlTime {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl PartialOrd for XacmlTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.normalized().partial_cmp(&other.normalized())
    }
}

macro_rules! string_conversions {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for String {
                fn from(value: $ty) -> Self {
                    value.to_string()
                }
            }

            impl TryFrom<String> for $ty {
                type Error = DataTypeError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }
        )*
    };
}

string_conversions!(XacmlDateTime, XacmlDate, XacmlTime);
