use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::ExpressionResult;
use crate::bag::Bag;
use crate::datatypes;
use crate::error::EvaluationError;
use crate::eval::EvaluationContext;
use crate::identifier::{self, Identifier};
use crate::pip::AttributeRequest;
use crate::policy::PolicyDefaults;
use crate::status::{MissingAttributeDetail, Status};

/// Selects values out of a category's structured request content.
///
/// `path` is a JSON Pointer. When `context_selector_id` is set, the attribute
/// it names (in the same category) holds a pointer to the node the path is
/// resolved against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSelector {
    pub category: Identifier,
    pub path: String,
    pub data_type: Identifier,
    #[serde(default)]
    pub context_selector_id: Option<Identifier>,
    #[serde(default)]
    pub must_be_present: bool,
}

impl AttributeSelector {
    pub fn new(category: Identifier, path: impl Into<String>, data_type: Identifier) -> Self {
        Self {
            category,
            path: path.into(),
            data_type,
            context_selector_id: None,
            must_be_present: false,
        }
    }

    pub fn with_context_selector(mut self, attribute_id: impl Into<Identifier>) -> Self {
        self.context_selector_id = Some(attribute_id.into());
        self
    }

    pub fn must_be_present(mut self, must_be_present: bool) -> Self {
        self.must_be_present = must_be_present;
        self
    }

    pub fn evaluate(
        &self,
        context: &dyn EvaluationContext,
        defaults: Option<&PolicyDefaults>,
    ) -> Result<ExpressionResult, EvaluationError> {
        if let Some(version) = defaults.and_then(PolicyDefaults::path_version) {
            if version != &identifier::PATH_VERSION_JSON_POINTER {
                return Err(EvaluationError::Selector(format!(
                    "Unsupported path version \"{}\"",
                    version
                )));
            }
        }

        let bag = match context.content(&self.category) {
            Some(content) => match self.context_node(context, content)? {
                Some(node) => self.select(node)?,
                None => Bag::new(),
            },
            None => Bag::new(),
        };

        if bag.is_empty() && self.must_be_present {
            return Ok(ExpressionResult::error(Status::missing_attribute(
                format!("No content selected by \"{}\"", self.path),
                MissingAttributeDetail {
                    category: self.category.clone(),
                    attribute_id: Identifier::new(self.path.clone()),
                    data_type: self.data_type.clone(),
                    issuer: None,
                },
            )));
        }
        Ok(ExpressionResult::bag(bag))
    }

    fn context_node<'c>(
        &self,
        context: &dyn EvaluationContext,
        content: &'c JsonValue,
    ) -> Result<Option<&'c JsonValue>, EvaluationError> {
        let Some(selector_id) = &self.context_selector_id else {
            return Ok(Some(content));
        };

        let response = context.attributes(&AttributeRequest {
            category: self.category.clone(),
            attribute_id: selector_id.clone(),
            data_type: identifier::DATATYPE_STRING,
            issuer: None,
        });
        if !response.status.is_ok() {
            return Err(EvaluationError::Selector(
                response.status.message().unwrap_or("context selector lookup failed").to_string(),
            ));
        }

        match response.bag.values() {
            [] => Ok(None),
            [pointer] => Ok(content.pointer(&pointer.value.to_string())),
            values => Err(EvaluationError::Selector(format!(
                "Context selector \"{}\" has {} values, expected 1",
                selector_id,
                values.len()
            ))),
        }
    }

    fn select(&self, node: &JsonValue) -> Result<Bag, EvaluationError> {
        let Some(selected) = node.pointer(&self.path) else {
            return Ok(Bag::new());
        };

        match selected {
            JsonValue::Array(items) => items.iter().map(|item| self.convert(item)).collect(),
            other => self.convert(other).map(|value| std::iter::once(value).collect()),
        }
    }

    fn convert(&self, node: &JsonValue) -> Result<datatypes::AttributeValue, EvaluationError> {
        let lexical = match node {
            JsonValue::String(s) => s.clone(),
            JsonValue::Number(n) => n.to_string(),
            JsonValue::Bool(b) => b.to_string(),
            JsonValue::Null => {
                return Err(EvaluationError::Selector(format!("Null value at \"{}\"", self.path)));
            }
            JsonValue::Array(_) | JsonValue::Object(_) => {
                return Err(EvaluationError::Selector(format!(
                    "Structured value at \"{}\" cannot be converted to {}",
                    self.path, self.data_type
                )));
            }
        };
        datatypes::create_attribute_value(&self.data_type, &lexical)
            .map_err(|e| EvaluationError::Selector(e.status_message()))
    }
}
