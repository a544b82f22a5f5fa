//! ISO-8601 durations (`xs:dayTimeDuration`, `xs:yearMonthDuration`)

use chrono::TimeDelta;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DataTypeError;

static DURATION_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^(-)?P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.(\d{1,9}))?S)?)?$",
    )
    .ok()
});

/// A signed ISO-8601 duration.
///
/// Fields a literal leaves out are zero, so arithmetic can always apply the
/// full field set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Iso8601Duration {
    pub negative: bool,
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
    pub nanos: u32,
}

impl Iso8601Duration {
    pub fn year_month(years: u32, months: u32) -> Self {
        Self {
            years,
            months,
            ..Self::default()
        }
    }

    pub fn day_time(days: u32, hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
            ..Self::default()
        }
    }

    pub fn negated(mut self) -> Self {
        self.negative = !self.negative;
        self
    }

    pub fn is_zero(&self) -> bool {
        !self.has_year_month_fields() && !self.has_day_time_fields()
    }

    pub fn has_year_month_fields(&self) -> bool {
        self.years != 0 || self.months != 0
    }

    pub fn has_day_time_fields(&self) -> bool {
        self.days != 0 || self.hours != 0 || self.minutes != 0 || self.seconds != 0 || self.nanos != 0
    }

    /// Years and months folded into a month count, ignoring the sign
    pub fn total_months(&self) -> Option<u32> {
        self.years.checked_mul(12)?.checked_add(self.months)
    }

    /// Days and time fields as an unsigned delta, ignoring the sign
    pub fn day_time_delta(&self) -> Option<TimeDelta> {
        let seconds = i64::from(self.days) * 86_400
            + i64::from(self.hours) * 3_600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        TimeDelta::try_seconds(seconds)?.checked_add(&TimeDelta::nanoseconds(i64::from(self.nanos)))
    }
}

impl FromStr for Iso8601Duration {
    type Err = DataTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DataTypeError::Other(format!("Invalid ISO8601 duration \"{}\"", s));

        let trimmed = s.trim();
        if trimmed.ends_with('P') || trimmed.ends_with('T') {
            return Err(invalid());
        }
        let pattern = DURATION_PATTERN.as_ref().ok_or_else(invalid)?;
        let captures = pattern.captures(trimmed).ok_or_else(invalid)?;

        let field = |index: usize| -> Result<u32, DataTypeError> {
            match captures.get(index) {
                Some(m) => m.as_str().parse::<u32>().map_err(|e| DataTypeError::Conversion {
                    data_type: "duration",
                    value: s.to_string(),
                    source: Some(Box::new(e)),
                }),
                None => Ok(0),
            }
        };

        let nanos = match captures.get(8) {
            Some(fraction) => {
                let digits = fraction.as_str();
                format!("{:0<9}", digits).parse::<u32>().map_err(|_| invalid())?
            }
            None => 0,
        };

        Ok(Self {
            negative: captures.get(1).is_some(),
            years: field(2)?,
            months: field(3)?,
            days: field(4)?,
            hours: field(5)?,
            minutes: field(6)?,
            seconds: field(7)?,
            nanos,
        })
    }
}

impl fmt::Display for Iso8601Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        if self.years != 0 {
            write!(f, "{}Y", self.years)?;
        }
        if self.months != 0 {
            write!(f, "{}M", self.months)?;
        }
        if self.days != 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours != 0 || self.minutes != 0 || self.seconds != 0 || self.nanos != 0 {
            f.write_str("T")?;
            if self.hours != 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes != 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds != 0 || self.nanos != 0 {
                if self.nanos != 0 {
                    let fraction = format!("{:09}", self.nanos);
                    write!(f, "{}.{}S", self.seconds, fraction.trim_end_matches('0'))?;
                } else {
                    write!(f, "{}S", self.seconds)?;
                }
            }
        }
        Ok(())
    }
}

impl From<Iso8601Duration> for String {
    fn from(value: Iso8601Duration) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Iso8601Duration {
    type Error = DataTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_duration() {
        let d: Iso8601Duration = "P1Y2M3DT4H5M6.5S".parse().unwrap();
        assert_eq!(d.years, 1);
        assert_eq!(d.months, 2);
        assert_eq!(d.days, 3);
        assert_eq!(d.hours, 4);
        assert_eq!(d.minutes, 5);
        assert_eq!(d.seconds, 6);
        assert_eq!(d.nanos, 500_000_000);
        assert!(!d.negative);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let d: Iso8601Duration = "PT2H".parse().unwrap();
        assert_eq!(d, Iso8601Duration { hours: 2, ..Default::default() });

        let d: Iso8601Duration = "-P1M".parse().unwrap();
        assert!(d.negative);
        assert_eq!(d.total_months(), Some(1));
        assert_eq!(d.days, 0);
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in ["", "P", "PT", "1D", "P1H", "PT1D", "P1.5Y", "P-1D"] {
            assert!(bad.parse::<Iso8601Duration>().is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["P1Y2M", "P3DT4H", "-PT30M", "PT1.25S", "PT0S"] {
            let d: Iso8601Duration = text.parse().unwrap();
            assert_eq!(d.to_string(), text);
        }
    }

    #[test]
    fn test_day_time_delta() {
        let d = Iso8601Duration::day_time(1, 1, 1, 1);
        assert_eq!(d.day_time_delta().unwrap().num_seconds(), 86_400 + 3_600 + 60 + 1);
    }
}
