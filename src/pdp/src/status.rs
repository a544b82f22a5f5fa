//! Evaluation status: the data form of every evaluation failure

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identifier::Identifier;

/// Status code taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusCode {
    Ok,
    /// Attribute could not be resolved and the policy required it
    MissingAttribute,
    /// Malformed policy structure
    SyntaxError,
    /// Runtime evaluation failure
    ProcessingError,
}

impl StatusCode {
    /// XACML status URN
    pub fn urn(&self) -> &'static str {
        match self {
            StatusCode::Ok => "urn:oasis:names:tc:xacml:1.0:status:ok",
            StatusCode::MissingAttribute => "urn:oasis:names:tc:xacml:1.0:status:missing-attribute",
            StatusCode::SyntaxError => "urn:oasis:names:tc:xacml:1.0:status:syntax-error",
            StatusCode::ProcessingError => "urn:oasis:names:tc:xacml:1.0:status:processing-error",
        }
    }
}

/// Describes an attribute that evaluation needed but could not find
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingAttributeDetail {
    pub category: Identifier,
    pub attribute_id: Identifier,
    pub data_type: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Identifier>,
}

/// Outcome status of an evaluation step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: StatusCode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_attributes: Vec<MissingAttributeDetail>,
}

/// The OK status
pub const STATUS_OK: Status = Status {
    code: StatusCode::Ok,
    message: None,
    missing_attributes: Vec::new(),
};

impl Status {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            missing_attributes: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        STATUS_OK
    }

    pub fn processing_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::ProcessingError, message)
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SyntaxError, message)
    }

    pub fn missing_attribute(message: impl Into<String>, detail: MissingAttributeDetail) -> Self {
        Self {
            code: StatusCode::MissingAttribute,
            message: Some(message.into()),
            missing_attributes: vec![detail],
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Copy of this status with `prefix` prepended to the message
    pub fn with_prefix(&self, prefix: &str) -> Self {
        let message = match &self.message {
            Some(message) => format!("{} {}", prefix, message),
            None => prefix.to_string(),
        };
        Self {
            code: self.code,
            message: Some(message),
            missing_attributes: self.missing_attributes.clone(),
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        STATUS_OK
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.code.urn(), message),
            None => f.write_str(self.code.urn()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_status() {
        assert!(Status::ok().is_ok());
        assert_eq!(Status::default(), STATUS_OK);
        assert!(!Status::processing_error("boom").is_ok());
    }

    #[test]
    fn test_with_prefix() {
        let status = Status::processing_error("Got null argument").with_prefix("string-equal");
        assert_eq!(status.message(), Some("string-equal Got null argument"));
        assert_eq!(status.code, StatusCode::ProcessingError);
    }
}
