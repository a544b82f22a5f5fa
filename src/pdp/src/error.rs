//! Error types for the policy decision point
//!
//! `PdpError` covers everything that can fail *outside* of request evaluation:
//! building policy trees, loading policy documents, reading configuration.
//! Failures during evaluation are carried as [`Status`](crate::status::Status)
//! values instead, see [`EvaluationError`].

use thiserror::Error;

use crate::identifier::Identifier;

/// Policy decision point errors
#[derive(Debug, Error)]
pub enum PdpError {
    /// Malformed policy structure (strict construction only)
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Combining algorithm identifier not known to the registry
    #[error("Unknown combining algorithm \"{0}\"")]
    UnknownCombiningAlgorithm(Identifier),

    /// Variable reference without a matching definition
    #[error("Unknown variable \"{variable_id}\" in policy \"{policy_id}\"")]
    UnknownVariable {
        policy_id: Identifier,
        variable_id: String,
    },

    /// Policy not found
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    /// No usable location configured for a policy
    #[error("Policy location error: {0}")]
    PolicyLocation(String),

    /// The external policy loader rejected a document
    #[error("Policy load failed: {0}")]
    Load(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Decision did not complete within the dispatch timeout
    #[error("Decision timed out after {0} ms")]
    Timeout(u64),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error while fetching a policy location
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML configuration parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for policy decision point operations
pub type Result<T> = std::result::Result<T, PdpError>;

/// Failure raised while evaluating an expression.
///
/// These never escape the function-argument boundary: a lazily bound
/// argument turns them into a processing-error status.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluationError {
    #[error("{0}")]
    Processing(String),

    #[error("Attribute resolution failed: {0}")]
    AttributeResolution(String),

    #[error("Selector error: {0}")]
    Selector(String),
}

/// Failure converting a value into a data type's native representation
#[derive(Debug, Error)]
pub enum DataTypeError {
    #[error("Failed to convert \"{value}\" to {data_type}")]
    Conversion {
        data_type: &'static str,
        value: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Cannot convert {found} value to {data_type}")]
    Incompatible {
        data_type: &'static str,
        found: &'static str,
    },

    #[error("Unknown data type \"{0}\"")]
    UnknownDataType(Identifier),

    #[error("{0}")]
    Other(String),
}

impl DataTypeError {
    /// Message used when a conversion failure becomes a status.
    ///
    /// Prefers the wrapped cause's message when there is one.
    pub fn status_message(&self) -> String {
        use std::error::Error as _;

        match self.source() {
            Some(cause) => cause.to_string(),
            None => self.to_string(),
        }
    }
}

/// Failure reported by a single attribute resolver
#[derive(Debug, Error)]
pub enum PipError {
    #[error("Attribute source unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid attribute request: {0}")]
    InvalidRequest(String),

    #[error("Value conversion failed: {0}")]
    DataType(#[from] DataTypeError),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_prefers_cause() {
        let parse_err = "abc".parse::<i64>().unwrap_err();
        let err = DataTypeError::Conversion {
            data_type: "integer",
            value: "abc".to_string(),
            source: Some(Box::new(parse_err.clone())),
        };

        assert_eq!(err.status_message(), parse_err.to_string());
    }

    #[test]
    fn test_status_message_without_cause() {
        let err = DataTypeError::Incompatible {
            data_type: "boolean",
            found: "integer",
        };

        assert_eq!(err.status_message(), "Cannot convert integer value to boolean");
    }
}
