use crate::bag::Bag;
use crate::datatypes::AttributeValue;
use crate::status::Status;

/// Payload of a successful expression evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionValue {
    Single(AttributeValue),
    Bag(Bag),
}

/// Outcome of evaluating an expression.
///
/// A payload is present exactly when the status is OK.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionResult {
    status: Status,
    payload: Option<ExpressionValue>,
}

impl ExpressionResult {
    pub fn single(value: AttributeValue) -> Self {
        Self {
            status: Status::ok(),
            payload: Some(ExpressionValue::Single(value)),
        }
    }

    pub fn bag(bag: Bag) -> Self {
        Self {
            status: Status::ok(),
            payload: Some(ExpressionValue::Bag(bag)),
        }
    }

    pub fn empty_bag() -> Self {
        Self::bag(Bag::new())
    }

    /// Error result. An OK status carries no payload here, so it becomes a
    /// processing error.
    pub fn error(status: Status) -> Self {
        let status = if status.is_ok() {
            Status::processing_error("Missing expression result")
        } else {
            status
        };
        Self { status, payload: None }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn is_bag(&self) -> bool {
        matches!(self.payload, Some(ExpressionValue::Bag(_)))
    }

    pub fn value(&self) -> Option<&AttributeValue> {
        match &self.payload {
            Some(ExpressionValue::Single(value)) => Some(value),
            _ => None,
        }
    }

    pub fn bag_value(&self) -> Option<&Bag> {
        match &self.payload {
            Some(ExpressionValue::Bag(bag)) => Some(bag),
            _ => None,
        }
    }

    pub fn into_payload(self) -> Option<ExpressionValue> {
        self.payload
    }
}
