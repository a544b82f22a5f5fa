//! Typed attribute values and XACML data types
//!
//! Every [`AttributeValue`] carries its data-type identifier next to a
//! [`Value`]. A [`DataType`] knows how to convert any value (including a
//! lexical string) into its native Rust representation and back.
//!
//! # Example
//!
//! ```rust
//! use cretoai_pdp::datatypes::{AttributeValue, DataType, DataTypeInteger};
//!
//! let value = AttributeValue::string("42");
//! let native = DataTypeInteger::convert(&value.value).unwrap();
//! assert_eq!(native, 42);
//! ```

pub mod duration;
pub mod iso8601;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DataTypeError;
use crate::identifier::{self, Identifier};

pub use duration::Iso8601Duration;
pub use iso8601::{DateTimeArithmetic, TimeZoneOffset, XacmlDate, XacmlDateTime, XacmlTime};

/// Raw value payload of an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Value {
    String(String),
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Date(XacmlDate),
    DateTime(XacmlDateTime),
    Time(XacmlTime),
    AnyUri(String),
    Duration(Iso8601Duration),
}

impl Value {
    /// Name of the payload variant, used in conversion errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::Date(_) => "date",
            Value::DateTime(_) => "dateTime",
            Value::Time(_) => "time",
            Value::AnyUri(_) => "anyURI",
            Value::Duration(_) => "duration",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::AnyUri(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d),
            Value::Date(d) => write!(f, "{}", d),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::Time(t) => write!(f, "{}", t),
            Value::Duration(d) => write!(f, "{}", d),
        }
    }
}

/// A single typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub data_type: Identifier,
    pub value: Value,
}

impl AttributeValue {
    pub fn new(data_type: Identifier, value: Value) -> Self {
        Self { data_type, value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(identifier::DATATYPE_STRING, Value::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(identifier::DATATYPE_BOOLEAN, Value::Boolean(value))
    }

    pub fn integer(value: i64) -> Self {
        Self::new(identifier::DATATYPE_INTEGER, Value::Integer(value))
    }

    pub fn double(value: f64) -> Self {
        Self::new(identifier::DATATYPE_DOUBLE, Value::Double(value))
    }

    pub fn any_uri(value: impl Into<String>) -> Self {
        Self::new(identifier::DATATYPE_ANYURI, Value::AnyUri(value.into()))
    }

    pub fn date(value: XacmlDate) -> Self {
        Self::new(identifier::DATATYPE_DATE, Value::Date(value))
    }

    pub fn date_time(value: XacmlDateTime) -> Self {
        Self::new(identifier::DATATYPE_DATETIME, Value::DateTime(value))
    }

    pub fn time(value: XacmlTime) -> Self {
        Self::new(identifier::DATATYPE_TIME, Value::Time(value))
    }

    pub fn day_time_duration(value: Iso8601Duration) -> Self {
        Self::new(identifier::DATATYPE_DAYTIMEDURATION, Value::Duration(value))
    }

    pub fn year_month_duration(value: Iso8601Duration) -> Self {
        Self::new(identifier::DATATYPE_YEARMONTHDURATION, Value::Duration(value))
    }

    pub fn is_type(&self, data_type: &Identifier) -> bool {
        &self.data_type == data_type
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// An XACML data type with a native Rust representation
pub trait DataType: Send + Sync + 'static {
    type Native: Clone + fmt::Debug + PartialEq + Send + Sync;

    /// Full data-type identifier
    fn id() -> Identifier;

    /// Short name used in error messages
    fn short_name() -> &'static str;

    /// Convert a value into the native representation
    fn convert(value: &Value) -> Result<Self::Native, DataTypeError>;

    /// Wrap a native value as a `Value` payload
    fn to_value(native: Self::Native) -> Value;

    /// Build a typed attribute value from a native value
    fn create_attribute_value(native: Self::Native) -> Result<AttributeValue, DataTypeError> {
        Ok(AttributeValue::new(Self::id(), Self::to_value(native)))
    }

    /// Parse a lexical string into a typed attribute value
    fn from_lexical(lexical: &str) -> Result<AttributeValue, DataTypeError> {
        let native = Self::convert(&Value::String(lexical.to_string()))?;
        Self::create_attribute_value(native)
    }
}

fn conversion<E>(data_type: &'static str, value: &str, source: E) -> DataTypeError
where
    E: std::error::Error + Send + Sync + 'static,
{
    DataTypeError::Conversion {
        data_type,
        value: value.to_string(),
        source: Some(Box::new(source)),
    }
}

fn incompatible<T: DataType>(value: &Value) -> DataTypeError {
    DataTypeError::Incompatible {
        data_type: T::short_name(),
        found: value.kind_name(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeString;

impl DataType for DataTypeString {
    type Native = String;

    fn id() -> Identifier {
        identifier::DATATYPE_STRING
    }

    fn short_name() -> &'static str {
        "string"
    }

    fn convert(value: &Value) -> Result<String, DataTypeError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }

    fn to_value(native: String) -> Value {
        Value::String(native)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeBoolean;

impl DataType for DataTypeBoolean {
    type Native = bool;

    fn id() -> Identifier {
        identifier::DATATYPE_BOOLEAN
    }

    fn short_name() -> &'static str {
        "boolean"
    }

    fn convert(value: &Value) -> Result<bool, DataTypeError> {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) => match s.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(DataTypeError::Conversion {
                    data_type: "boolean",
                    value: s.clone(),
                    source: None,
                }),
            },
            other => Err(incompatible::<Self>(other)),
        }
    }

    fn to_value(native: bool) -> Value {
        Value::Boolean(native)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeInteger;

impl DataType for DataTypeInteger {
    type Native = i64;

    fn id() -> Identifier {
        identifier::DATATYPE_INTEGER
    }

    fn short_name() -> &'static str {
        "integer"
    }

    fn convert(value: &Value) -> Result<i64, DataTypeError> {
        match value {
            Value::Integer(i) => Ok(*i),
            Value::String(s) => s.trim().parse().map_err(|e| conversion("integer", s, e)),
            other => Err(incompatible::<Self>(other)),
        }
    }

    fn to_value(native: i64) -> Value {
        Value::Integer(native)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeDouble;

impl DataType for DataTypeDouble {
    type Native = f64;

    fn id() -> Identifier {
        identifier::DATATYPE_DOUBLE
    }

    fn short_name() -> &'static str {
        "double"
    }

    fn convert(value: &Value) -> Result<f64, DataTypeError> {
        match value {
            Value::Double(d) => Ok(*d),
            Value::Integer(i) => Ok(*i as f64),
            Value::String(s) => match s.trim() {
                "INF" => Ok(f64::INFINITY),
                "-INF" => Ok(f64::NEG_INFINITY),
                trimmed => trimmed.parse().map_err(|e| conversion("double", s, e)),
            },
            other => Err(incompatible::<Self>(other)),
        }
    }

    fn to_value(native: f64) -> Value {
        Value::Double(native)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeAnyUri;

impl DataType for DataTypeAnyUri {
    type Native = String;

    fn id() -> Identifier {
        identifier::DATATYPE_ANYURI
    }

    fn short_name() -> &'static str {
        "anyURI"
    }

    fn convert(value: &Value) -> Result<String, DataTypeError> {
        match value {
            Value::AnyUri(s) => Ok(s.clone()),
            Value::String(s) if !s.trim().contains(char::is_whitespace) => Ok(s.trim().to_string()),
            Value::String(s) => Err(DataTypeError::Conversion {
                data_type: "anyURI",
                value: s.clone(),
                source: None,
            }),
            other => Err(incompatible::<Self>(other)),
        }
    }

    fn to_value(native: String) -> Value {
        Value::AnyUri(native)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeDate;

impl DataType for DataTypeDate {
    type Native = XacmlDate;

    fn id() -> Identifier {
        identifier::DATATYPE_DATE
    }

    fn short_name() -> &'static str {
        "date"
    }

    fn convert(value: &Value) -> Result<XacmlDate, DataTypeError> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::DateTime(dt) => Ok(XacmlDate::new(dt.local.date(), dt.zone)),
            Value::String(s) => s.parse(),
            other => Err(incompatible::<Self>(other)),
        }
    }

    fn to_value(native: XacmlDate) -> Value {
        Value::Date(native)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeDateTime;

impl DataType for DataTypeDateTime {
    type Native = XacmlDateTime;

    fn id() -> Identifier {
        identifier::DATATYPE_DATETIME
    }

    fn short_name() -> &'static str {
        "dateTime"
    }

    fn convert(value: &Value) -> Result<XacmlDateTime, DataTypeError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::String(s) => s.parse(),
            other => Err(incompatible::<Self>(other)),
        }
    }

    fn to_value(native: XacmlDateTime) -> Value {
        Value::DateTime(native)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeTime;

impl DataType for DataTypeTime {
    type Native = XacmlTime;

    fn id() -> Identifier {
        identifier::DATATYPE_TIME
    }

    fn short_name() -> &'static str {
        "time"
    }

    fn convert(value: &Value) -> Result<XacmlTime, DataTypeError> {
        match value {
            Value::Time(t) => Ok(*t),
            Value::DateTime(dt) => Ok(XacmlTime::new(dt.local.time(), dt.zone)),
            Value::String(s) => s.parse(),
            other => Err(incompatible::<Self>(other)),
        }
    }

    fn to_value(native: XacmlTime) -> Value {
        Value::Time(native)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeDayTimeDuration;

impl DataType for DataTypeDayTimeDuration {
    type Native = Iso8601Duration;

    fn id() -> Identifier {
        identifier::DATATYPE_DAYTIMEDURATION
    }

    fn short_name() -> &'static str {
        "dayTimeDuration"
    }

    fn convert(value: &Value) -> Result<Iso8601Duration, DataTypeError> {
        let duration = match value {
            Value::Duration(d) => *d,
            Value::String(s) => s.parse()?,
            other => return Err(incompatible::<Self>(other)),
        };
        if duration.has_year_month_fields() {
            return Err(DataTypeError::Other(format!(
                "Invalid dayTimeDuration \"{}\": year or month fields present",
                duration
            )));
        }
        Ok(duration)
    }

    fn to_value(native: Iso8601Duration) -> Value {
        Value::Duration(native)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypeYearMonthDuration;

impl DataType for DataTypeYearMonthDuration {
    type Native = Iso8601Duration;

    fn id() -> Identifier {
        identifier::DATATYPE_YEARMONTHDURATION
    }

    fn short_name() -> &'static str {
        "yearMonthDuration"
    }

    fn convert(value: &Value) -> Result<Iso8601Duration, DataTypeError> {
        let duration = match value {
            Value::Duration(d) => *d,
            Value::String(s) => s.parse()?,
            other => return Err(incompatible::<Self>(other)),
        };
        if duration.has_day_time_fields() {
            return Err(DataTypeError::Other(format!(
                "Invalid yearMonthDuration \"{}\": day or time fields present",
                duration
            )));
        }
        Ok(duration)
    }

    fn to_value(native: Iso8601Duration) -> Value {
        Value::Duration(native)
    }
}

/// Parse a lexical value for a data type known only at runtime
///
/// Used wherever the type comes from policy content, e.g. attribute selectors.
pub fn create_attribute_value(data_type: &Identifier, lexical: &str) -> Result<AttributeValue, DataTypeError> {
    match data_type.as_str() {
        s if s == identifier::DATATYPE_STRING.as_str() => DataTypeString::from_lexical(lexical),
        s if s == identifier::DATATYPE_BOOLEAN.as_str() => DataTypeBoolean::from_lexical(lexical),
        s if s == identifier::DATATYPE_INTEGER.as_str() => DataTypeInteger::from_lexical(lexical),
        s if s == identifier::DATATYPE_DOUBLE.as_str() => DataTypeDouble::from_lexical(lexical),
        s if s == identifier::DATATYPE_ANYURI.as_str() => DataTypeAnyUri::from_lexical(lexical),
        s if s == identifier::DATATYPE_DATE.as_str() => DataTypeDate::from_lexical(lexical),
        s if s == identifier::DATATYPE_DATETIME.as_str() => DataTypeDateTime::from_lexical(lexical),
        s if s == identifier::DATATYPE_TIME.as_str() => DataTypeTime::from_lexical(lexical),
        s if s == identifier::DATATYPE_DAYTIMEDURATION.as_str() => {
            DataTypeDayTimeDuration::from_lexical(lexical)
        }
        s if s == identifier::DATATYPE_YEARMONTHDURATION.as_str() => {
            DataTypeYearMonthDuration::from_lexical(lexical)
        }
        _ => Err(DataTypeError::UnknownDataType(data_type.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_conversion() {
        assert_eq!(DataTypeInteger::convert(&Value::Integer(7)).unwrap(), 7);
        assert_eq!(DataTypeInteger::convert(&Value::String(" 12 ".into())).unwrap(), 12);

        let err = DataTypeInteger::convert(&Value::String("twelve".into())).unwrap_err();
        assert!(matches!(err, DataTypeError::Conversion { .. }));

        let err = DataTypeInteger::convert(&Value::Boolean(true)).unwrap_err();
        assert_eq!(err.to_string(), "Cannot convert boolean value to integer");
    }

    #[test]
    fn test_boolean_lexical_forms() {
        assert!(DataTypeBoolean::convert(&Value::String("1".into())).unwrap());
        assert!(!DataTypeBoolean::convert(&Value::String("false".into())).unwrap());
        assert!(DataTypeBoolean::convert(&Value::String("yes".into())).is_err());
    }

    #[test]
    fn test_string_accepts_any_value() {
        assert_eq!(DataTypeString::convert(&Value::Integer(5)).unwrap(), "5");
    }

    #[test]
    fn test_duration_kinds_are_checked() {
        let ym = Value::String("P1Y".into());
        assert!(DataTypeYearMonthDuration::convert(&ym).is_ok());
        assert!(DataTypeDayTimeDuration::convert(&ym).is_err());

        let dt = Value::String("PT1H".into());
        assert!(DataTypeDayTimeDuration::convert(&dt).is_ok());
        assert!(DataTypeYearMonthDuration::convert(&dt).is_err());
    }

    #[test]
    fn test_create_attribute_value_by_id() {
        let value = create_attribute_value(&identifier::DATATYPE_INTEGER, "99").unwrap();
        assert_eq!(value, AttributeValue::integer(99));

        let value = create_attribute_value(&identifier::DATATYPE_DATETIME, "2024-01-01T00:00:00Z").unwrap();
        assert!(value.is_type(&identifier::DATATYPE_DATETIME));

        let unknown = Identifier::new("urn:example:no-such-type");
        assert!(matches!(
            create_attribute_value(&unknown, "x"),
            Err(DataTypeError::UnknownDataType(_))
        ));
    }

    #[test]
    fn test_non_ascii_calendar_lexicals_are_errors() {
        assert!(create_attribute_value(&identifier::DATATYPE_TIME, "12:00:0é").is_err());
        assert!(create_attribute_value(&identifier::DATATYPE_DATE, "2020-01-0é").is_err());
        assert!(DataTypeTime::convert(&Value::String("1é:00:00+01:00".into())).is_err());
    }

    #[test]
    fn test_attribute_value_serde() {
        let value = AttributeValue::integer(3);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["value"]["kind"], "integer");
        let back: AttributeValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }
}
