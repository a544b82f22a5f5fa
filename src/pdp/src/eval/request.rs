use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::bag::Bag;
use crate::datatypes::AttributeValue;
use crate::identifier::Identifier;
use crate::pip::AttributeRequest;

/// A request attribute with one or more values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub attribute_id: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Identifier>,
    /// Echo this attribute in the decision result
    #[serde(default)]
    pub include_in_result: bool,
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    pub fn new(attribute_id: impl Into<Identifier>, value: AttributeValue) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            issuer: None,
            include_in_result: false,
            values: vec![value],
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<Identifier>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn include_in_result(mut self) -> Self {
        self.include_in_result = true;
        self
    }

    /// Issuer check: a request without issuer matches any attribute
    fn matches(&self, request: &AttributeRequest) -> bool {
        self.attribute_id == request.attribute_id
            && match &request.issuer {
                Some(issuer) => self.issuer.as_ref() == Some(issuer),
                None => true,
            }
    }
}

/// Attributes of one category, plus optional structured content for
/// attribute selectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestAttributes {
    pub category: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<JsonValue>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl RequestAttributes {
    pub fn new(category: Identifier) -> Self {
        Self {
            category,
            content: None,
            attributes: Vec::new(),
        }
    }
}

/// A decision request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Report the applicable policies in the result
    #[serde(default)]
    pub return_policy_id_list: bool,
    #[serde(default)]
    pub categories: Vec<RequestAttributes>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    fn category_mut(&mut self, category: &Identifier) -> &mut RequestAttributes {
        match self.categories.iter().position(|c| &c.category == category) {
            Some(index) => &mut self.categories[index],
            None => {
                self.categories.push(RequestAttributes::new(category.clone()));
                let last = self.categories.len() - 1;
                &mut self.categories[last]
            }
        }
    }

    /// Add a single-valued attribute
    pub fn with_attribute(self, category: Identifier, attribute_id: Identifier, value: AttributeValue) -> Self {
        self.with(category, Attribute::new(attribute_id, value))
    }

    /// Add a fully specified attribute
    pub fn with(mut self, category: Identifier, attribute: Attribute) -> Self {
        self.category_mut(&category).attributes.push(attribute);
        self
    }

    /// Attach structured content to a category
    pub fn with_content(mut self, category: Identifier, content: JsonValue) -> Self {
        self.category_mut(&category).content = Some(content);
        self
    }

    pub fn with_return_policy_id_list(mut self, enabled: bool) -> Self {
        self.return_policy_id_list = enabled;
        self
    }

    /// Values the request itself carries for an attribute, of the requested
    /// data type only
    pub fn attribute_values(&self, request: &AttributeRequest) -> Bag {
        self.categories
            .iter()
            .filter(|c| c.category == request.category)
            .flat_map(|c| c.attributes.iter())
            .filter(|attribute| attribute.matches(request))
            .flat_map(|attribute| attribute.values.iter())
            .filter(|value| value.is_type(&request.data_type))
            .cloned()
            .collect()
    }

    pub fn content(&self, category: &Identifier) -> Option<&JsonValue> {
        self.categories
            .iter()
            .find(|c| &c.category == category)
            .and_then(|c| c.content.as_ref())
    }

    /// Attributes flagged to be echoed in the result, grouped by category
    pub fn include_in_result_attributes(&self) -> Vec<RequestAttributes> {
        self.categories
            .iter()
            .filter_map(|c| {
                let attributes: Vec<Attribute> =
                    c.attributes.iter().filter(|a| a.include_in_result).cloned().collect();
                if attributes.is_empty() {
                    None
                } else {
                    Some(RequestAttributes {
                        category: c.category.clone(),
                        content: None,
                        attributes,
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{CATEGORY_ACCESS_SUBJECT, DATATYPE_INTEGER, DATATYPE_STRING, ID_SUBJECT_SUBJECT_ID};

    fn subject_request(data_type: Identifier, issuer: Option<&str>) -> AttributeRequest {
        AttributeRequest {
            category: CATEGORY_ACCESS_SUBJECT,
            attribute_id: ID_SUBJECT_SUBJECT_ID,
            data_type,
            issuer: issuer.map(Identifier::from),
        }
    }

    #[test]
    fn test_attribute_values_filter_type_and_issuer() {
        let request = Request::new()
            .with_attribute(CATEGORY_ACCESS_SUBJECT, ID_SUBJECT_SUBJECT_ID, AttributeValue::string("alice"))
            .with(
                CATEGORY_ACCESS_SUBJECT,
                Attribute::new(ID_SUBJECT_SUBJECT_ID, AttributeValue::string("bob")).with_issuer("urn:idp"),
            );

        assert_eq!(request.attribute_values(&subject_request(DATATYPE_STRING, None)).size(), 2);
        assert_eq!(request.attribute_values(&subject_request(DATATYPE_STRING, Some("urn:idp"))).size(), 1);
        assert!(request.attribute_values(&subject_request(DATATYPE_INTEGER, None)).is_empty());
    }

    #[test]
    fn test_include_in_result() {
        let request = Request::new()
            .with(
                CATEGORY_ACCESS_SUBJECT,
                Attribute::new(ID_SUBJECT_SUBJECT_ID, AttributeValue::string("alice")).include_in_result(),
            )
            .with_attribute(CATEGORY_ACCESS_SUBJECT, Identifier::new("urn:role"), AttributeValue::string("admin"));

        let echoed = request.include_in_result_attributes();
        assert_eq!(echoed.len(), 1);
        assert_eq!(echoed[0].attributes.len(), 1);
        assert_eq!(echoed[0].attributes[0].attribute_id, ID_SUBJECT_SUBJECT_ID);
    }
}
