//! Policy tree: Rule → Policy → PolicySet
//!
//! Trees are built once, through the builders in [`builder`], and shared
//! read-only across concurrent evaluations. Nothing on the evaluation path
//! mutates a node.
//!
//! # Example
//!
//! ```rust,ignore
//! let policy = PolicyBuilder::new("urn:example:policy", ParseMode::Strict)
//!     .combining_algorithm(&identifier::RULE_DENY_OVERRIDES)?
//!     .rule(RuleBuilder::new("permit-all", Effect::Permit, ParseMode::Strict).build()?)
//!     .build()?;
//! ```

pub mod builder;
pub mod obligation;
pub mod policy_set;
pub mod rule;
pub mod target;
pub mod version;
pub mod xacml_policy;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::datatypes::AttributeValue;
use crate::eval::{EvaluationContext, EvaluationResult};
use crate::identifier::Identifier;
use crate::status::Status;

pub use builder::{PolicyBuilder, PolicySetBuilder, RuleBuilder};
pub use obligation::{
    Advice, AdviceExpression, AttributeAssignment, AttributeAssignmentExpression, Obligation, ObligationExpression,
};
pub use policy_set::{PolicySet, PolicySetChild};
pub use rule::Rule;
pub use target::{AllOf, AnyOf, Match, MatchResult, Target};
pub use version::{IdReference, PolicyIdentifier, ReferenceKind, Version, VersionMatch};
pub use xacml_policy::Policy;

/// Rule effect, and the effect an obligation or advice applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    Permit,
    Deny,
}

/// How builders treat structural problems
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Reject with [`PdpError::Syntax`](crate::error::PdpError::Syntax)
    #[default]
    Strict,
    /// Warn, keep the first occurrence and continue
    Lenient,
}

/// Named configuration value handed to a combining algorithm
#[derive(Debug, Clone, PartialEq)]
pub struct CombinerParameter {
    pub name: String,
    pub value: AttributeValue,
}

impl CombinerParameter {
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Defaults scoped to a policy or policy set, inherited from the nearest
/// ancestor unless set locally
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyDefaults {
    path_version: Option<Identifier>,
    parent: Option<Arc<PolicyDefaults>>,
}

impl PolicyDefaults {
    pub fn new(path_version: Option<Identifier>, parent: Option<Arc<PolicyDefaults>>) -> Self {
        Self { path_version, parent }
    }

    /// Path version in effect: local value first, then the ancestors'
    pub fn path_version(&self) -> Option<&Identifier> {
        self.path_version
            .as_ref()
            .or_else(|| self.parent.as_deref().and_then(PolicyDefaults::path_version))
    }

    pub fn parent(&self) -> Option<&Arc<PolicyDefaults>> {
        self.parent.as_ref()
    }
}

/// A Policy or a PolicySet
#[derive(Debug)]
pub enum PolicyDef {
    Policy(Policy),
    PolicySet(PolicySet),
}

impl PolicyDef {
    pub fn id(&self) -> &Identifier {
        match self {
            PolicyDef::Policy(policy) => &policy.id,
            PolicyDef::PolicySet(policy_set) => &policy_set.id,
        }
    }

    pub fn version(&self) -> &Version {
        match self {
            PolicyDef::Policy(policy) => &policy.version,
            PolicyDef::PolicySet(policy_set) => &policy_set.version,
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        match self {
            PolicyDef::Policy(_) => ReferenceKind::Policy,
            PolicyDef::PolicySet(_) => ReferenceKind::PolicySet,
        }
    }

    pub fn defaults(&self) -> Option<&PolicyDefaults> {
        match self {
            PolicyDef::Policy(policy) => policy.defaults.as_deref(),
            PolicyDef::PolicySet(policy_set) => policy_set.defaults.as_deref(),
        }
    }

    pub fn identifier(&self) -> PolicyIdentifier {
        PolicyIdentifier {
            kind: self.kind(),
            id: self.id().clone(),
            version: self.version().clone(),
        }
    }

    /// Status of a node built from a document that failed to load
    pub fn load_status(&self) -> Option<&Status> {
        match self {
            PolicyDef::Policy(policy) => policy.load_status.as_ref(),
            PolicyDef::PolicySet(policy_set) => policy_set.load_status.as_ref(),
        }
    }

    /// Placeholder for a document the loader rejected: evaluates to
    /// Indeterminate carrying `status`
    pub fn placeholder(id: impl Into<Identifier>, status: Status) -> Self {
        PolicyDef::Policy(Policy::placeholder(id.into(), status))
    }

    pub fn match_target(&self, context: &dyn EvaluationContext) -> MatchResult {
        if let Some(status) = self.load_status() {
            return MatchResult::Indeterminate(status.clone());
        }
        match self {
            PolicyDef::Policy(policy) => policy.target.evaluate(context, self.defaults()),
            PolicyDef::PolicySet(policy_set) => policy_set.target.evaluate(context, self.defaults()),
        }
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext) -> EvaluationResult {
        match self {
            PolicyDef::Policy(policy) => policy.evaluate(context),
            PolicyDef::PolicySet(policy_set) => policy_set.evaluate(context),
        }
    }
}

impl From<Policy> for PolicyDef {
    fn from(policy: Policy) -> Self {
        PolicyDef::Policy(policy)
    }
}

impl From<PolicySet> for PolicyDef {
    fn from(policy_set: PolicySet) -> Self {
        PolicyDef::PolicySet(policy_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{PATH_VERSION_JSON_POINTER, XPATH_VERSION_2_0};

    #[test]
    fn test_defaults_inherit_from_parent() {
        let root = Arc::new(PolicyDefaults::new(Some(PATH_VERSION_JSON_POINTER), None));
        let child = PolicyDefaults::new(None, Some(Arc::clone(&root)));
        assert_eq!(child.path_version(), Some(&PATH_VERSION_JSON_POINTER));

        let overriding = PolicyDefaults::new(Some(XPATH_VERSION_2_0), Some(root));
        assert_eq!(overriding.path_version(), Some(&XPATH_VERSION_2_0));
    }
}
