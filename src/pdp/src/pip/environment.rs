use chrono::{DateTime, Utc};

use super::{AttributeRequest, PipEngine, PipFinder};
use crate::bag::Bag;
use crate::datatypes::{AttributeValue, TimeZoneOffset, XacmlDate, XacmlDateTime, XacmlTime};
use crate::error::PipError;
use crate::identifier::{
    CATEGORY_ENVIRONMENT, DATATYPE_DATE, DATATYPE_DATETIME, DATATYPE_TIME, ID_ENVIRONMENT_CURRENT_DATE,
    ID_ENVIRONMENT_CURRENT_DATETIME, ID_ENVIRONMENT_CURRENT_TIME,
};

/// Supplies `current-time`, `current-date` and `current-dateTime` in UTC.
///
/// The evaluation context caches each answer, so the values stay fixed for
/// the rest of a request.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentEngine {
    fixed: Option<DateTime<Utc>>,
}

impl EnvironmentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that always reports `now`
    pub fn fixed(now: DateTime<Utc>) -> Self {
        Self { fixed: Some(now) }
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed.unwrap_or_else(Utc::now)
    }
}

impl PipEngine for EnvironmentEngine {
    fn name(&self) -> &str {
        "environment"
    }

    fn supports(&self, request: &AttributeRequest) -> bool {
        if request.category != CATEGORY_ENVIRONMENT || request.issuer.is_some() {
            return false;
        }
        (request.attribute_id == ID_ENVIRONMENT_CURRENT_TIME && request.data_type == DATATYPE_TIME)
            || (request.attribute_id == ID_ENVIRONMENT_CURRENT_DATE && request.data_type == DATATYPE_DATE)
            || (request.attribute_id == ID_ENVIRONMENT_CURRENT_DATETIME && request.data_type == DATATYPE_DATETIME)
    }

    fn resolve(&self, request: &AttributeRequest, _finder: &dyn PipFinder) -> Result<Bag, PipError> {
        let now = self.now().naive_utc();
        let zone = Some(TimeZoneOffset::UTC);

        let value = if request.attribute_id == ID_ENVIRONMENT_CURRENT_TIME {
            AttributeValue::time(XacmlTime::new(now.time(), zone))
        } else if request.attribute_id == ID_ENVIRONMENT_CURRENT_DATE {
            AttributeValue::date(XacmlDate::new(now.date(), zone))
        } else if request.attribute_id == ID_ENVIRONMENT_CURRENT_DATETIME {
            AttributeValue::date_time(XacmlDateTime::new(now, zone))
        } else {
            return Err(PipError::InvalidRequest(format!(
                "Unsupported environment attribute \"{}\"",
                request.attribute_id
            )));
        };

        Ok(std::iter::once(value).collect())
    }
}
