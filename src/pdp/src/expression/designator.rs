use serde::{Deserialize, Serialize};

use super::ExpressionResult;
use crate::eval::EvaluationContext;
use crate::identifier::Identifier;
use crate::pip::AttributeRequest;
use crate::status::{MissingAttributeDetail, Status};

/// Names an attribute by category, id, data type and optional issuer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDesignator {
    pub category: Identifier,
    pub attribute_id: Identifier,
    pub data_type: Identifier,
    #[serde(default)]
    pub issuer: Option<Identifier>,
    #[serde(default)]
    pub must_be_present: bool,
}

impl AttributeDesignator {
    pub fn new(category: Identifier, attribute_id: Identifier, data_type: Identifier) -> Self {
        Self {
            category,
            attribute_id,
            data_type,
            issuer: None,
            must_be_present: false,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<Identifier>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn must_be_present(mut self, must_be_present: bool) -> Self {
        self.must_be_present = must_be_present;
        self
    }

    pub fn attribute_request(&self) -> AttributeRequest {
        AttributeRequest {
            category: self.category.clone(),
            attribute_id: self.attribute_id.clone(),
            data_type: self.data_type.clone(),
            issuer: self.issuer.clone(),
        }
    }

    pub(crate) fn missing_detail(&self) -> MissingAttributeDetail {
        MissingAttributeDetail {
            category: self.category.clone(),
            attribute_id: self.attribute_id.clone(),
            data_type: self.data_type.clone(),
            issuer: self.issuer.clone(),
        }
    }

    /// Always a bag on success; an empty bag is a missing-attribute status
    /// only when the attribute must be present.
    pub fn evaluate(&self, context: &dyn EvaluationContext) -> ExpressionResult {
        let response = context.attributes(&self.attribute_request());
        if !response.status.is_ok() {
            return ExpressionResult::error(response.status);
        }

        let bag = response.bag.filter_type(&self.data_type);
        if bag.is_empty() && self.must_be_present {
            return ExpressionResult::error(Status::missing_attribute(
                format!("Missing required attribute \"{}\"", self.attribute_id),
                self.missing_detail(),
            ));
        }
        ExpressionResult::bag(bag)
    }
}
