//! URN identifiers and the well-known XACML 3.0 constants

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A URN-style identifier (data type, category, attribute, function, algorithm)
///
/// Static identifiers are borrowed, so the constants below cost nothing to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(Cow<'static, str>);

impl Identifier {
    /// Identifier backed by a static string
    pub const fn from_static(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    /// Identifier from an owned string
    pub fn new(value: impl Into<String>) -> Self {
        Self(Cow::Owned(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// XACML 1.0 function identifier (`urn:oasis:names:tc:xacml:1.0:function:<name>`)
    pub fn function_v1(name: &str) -> Self {
        Self::new(format!("urn:oasis:names:tc:xacml:1.0:function:{}", name))
    }

    /// XACML 2.0 function identifier
    pub fn function_v2(name: &str) -> Self {
        Self::new(format!("urn:oasis:names:tc:xacml:2.0:function:{}", name))
    }

    /// XACML 3.0 function identifier
    pub fn function_v3(name: &str) -> Self {
        Self::new(format!("urn:oasis:names:tc:xacml:3.0:function:{}", name))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Data types
pub const DATATYPE_STRING: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#string");
pub const DATATYPE_BOOLEAN: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#boolean");
pub const DATATYPE_INTEGER: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#integer");
pub const DATATYPE_DOUBLE: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#double");
pub const DATATYPE_DATE: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#date");
pub const DATATYPE_DATETIME: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#dateTime");
pub const DATATYPE_TIME: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#time");
pub const DATATYPE_ANYURI: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#anyURI");
pub const DATATYPE_DAYTIMEDURATION: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#dayTimeDuration");
pub const DATATYPE_YEARMONTHDURATION: Identifier =
    Identifier::from_static("http://www.w3.org/2001/XMLSchema#yearMonthDuration");

// Categories
pub const CATEGORY_ACCESS_SUBJECT: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:subject-category:access-subject");
pub const CATEGORY_RESOURCE: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:3.0:attribute-category:resource");
pub const CATEGORY_ACTION: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:3.0:attribute-category:action");
pub const CATEGORY_ENVIRONMENT: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:3.0:attribute-category:environment");

// Attribute ids
pub const ID_SUBJECT_SUBJECT_ID: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:subject:subject-id");
pub const ID_RESOURCE_RESOURCE_ID: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:resource:resource-id");
pub const ID_ACTION_ACTION_ID: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:action:action-id");
pub const ID_ENVIRONMENT_CURRENT_TIME: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:environment:current-time");
pub const ID_ENVIRONMENT_CURRENT_DATE: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:environment:current-date");
pub const ID_ENVIRONMENT_CURRENT_DATETIME: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:environment:current-dateTime");

// Path versions understood by attribute selectors
pub const PATH_VERSION_JSON_POINTER: Identifier = Identifier::from_static("urn:ietf:rfc:6901");
pub const XPATH_VERSION_1_0: Identifier =
    Identifier::from_static("http://www.w3.org/TR/1999/REC-xpath-19991116");
pub const XPATH_VERSION_2_0: Identifier =
    Identifier::from_static("http://www.w3.org/TR/2007/REC-xpath20-20070123");

// Functions referenced directly by the engine and its tests
pub const FUNCTION_STRING_EQUAL: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:string-equal");
pub const FUNCTION_BOOLEAN_EQUAL: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:boolean-equal");
pub const FUNCTION_INTEGER_EQUAL: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:integer-equal");
pub const FUNCTION_STRING_ONE_AND_ONLY: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:string-one-and-only");
pub const FUNCTION_INTEGER_ONE_AND_ONLY: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:integer-one-and-only");
pub const FUNCTION_AND: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:and");
pub const FUNCTION_OR: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:or");
pub const FUNCTION_NOT: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:not");
pub const FUNCTION_INTEGER_GREATER_THAN: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:integer-greater-than");
pub const FUNCTION_STRING_REGEXP_MATCH: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:1.0:function:string-regexp-match");
pub const FUNCTION_DATETIME_ADD_DAYTIMEDURATION: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:function:dateTime-add-dayTimeDuration",
);
pub const FUNCTION_DATETIME_SUBTRACT_DAYTIMEDURATION: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:function:dateTime-subtract-dayTimeDuration",
);
pub const FUNCTION_DATETIME_ADD_YEARMONTHDURATION: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:function:dateTime-add-yearMonthDuration",
);
pub const FUNCTION_DATETIME_SUBTRACT_YEARMONTHDURATION: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:function:dateTime-subtract-yearMonthDuration",
);
pub const FUNCTION_DATE_ADD_YEARMONTHDURATION: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:function:date-add-yearMonthDuration",
);
pub const FUNCTION_DATE_SUBTRACT_YEARMONTHDURATION: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:function:date-subtract-yearMonthDuration",
);

// Rule combining algorithms
pub const RULE_DENY_OVERRIDES: Identifier =
    Identifier::from_static("urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-overrides");
pub const RULE_PERMIT_OVERRIDES: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:permit-overrides",
);
pub const RULE_ORDERED_DENY_OVERRIDES: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:ordered-deny-overrides",
);
pub const RULE_ORDERED_PERMIT_OVERRIDES: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:ordered-permit-overrides",
);
pub const RULE_DENY_UNLESS_PERMIT: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:deny-unless-permit",
);
pub const RULE_PERMIT_UNLESS_DENY: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:rule-combining-algorithm:permit-unless-deny",
);
pub const RULE_FIRST_APPLICABLE: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:1.0:rule-combining-algorithm:first-applicable",
);

// Policy combining algorithms
pub const POLICY_DENY_OVERRIDES: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:deny-overrides",
);
pub const POLICY_PERMIT_OVERRIDES: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:permit-overrides",
);
pub const POLICY_ORDERED_DENY_OVERRIDES: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:ordered-deny-overrides",
);
pub const POLICY_ORDERED_PERMIT_OVERRIDES: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:ordered-permit-overrides",
);
pub const POLICY_DENY_UNLESS_PERMIT: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:deny-unless-permit",
);
pub const POLICY_PERMIT_UNLESS_DENY: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:3.0:policy-combining-algorithm:permit-unless-deny",
);
pub const POLICY_FIRST_APPLICABLE: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:first-applicable",
);
pub const POLICY_ONLY_ONE_APPLICABLE: Identifier = Identifier::from_static(
    "urn:oasis:names:tc:xacml:1.0:policy-combining-algorithm:only-one-applicable",
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_and_owned_compare_equal() {
        let owned = Identifier::new("http://www.w3.org/2001/XMLSchema#string");
        assert_eq!(owned, DATATYPE_STRING);
    }

    #[test]
    fn test_function_namespaces() {
        assert_eq!(Identifier::function_v1("string-equal"), FUNCTION_STRING_EQUAL);
        assert_eq!(
            Identifier::function_v3("dateTime-add-dayTimeDuration"),
            FUNCTION_DATETIME_ADD_DAYTIMEDURATION
        );
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&DATATYPE_INTEGER).unwrap();
        assert_eq!(json, "\"http://www.w3.org/2001/XMLSchema#integer\"");

        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DATATYPE_INTEGER);
    }
}
