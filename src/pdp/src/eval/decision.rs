use serde::{Deserialize, Serialize};
use std::fmt;

use crate::policy::obligation::{Advice, Obligation};
use crate::policy::{Effect, PolicyIdentifier};
use crate::status::Status;

/// Decision, including the extended Indeterminate forms used while
/// combining
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Permit,
    Deny,
    NotApplicable,
    Indeterminate,
    /// Could have evaluated to Deny
    IndeterminateDeny,
    /// Could have evaluated to Permit
    IndeterminatePermit,
    /// Could have evaluated to Deny or Permit
    IndeterminateDenyPermit,
}

impl Decision {
    pub fn is_indeterminate(&self) -> bool {
        matches!(
            self,
            Decision::Indeterminate
                | Decision::IndeterminateDeny
                | Decision::IndeterminatePermit
                | Decision::IndeterminateDenyPermit
        )
    }

    /// The four-valued decision reported to callers
    pub fn collapse(&self) -> Decision {
        if self.is_indeterminate() {
            Decision::Indeterminate
        } else {
            *self
        }
    }

    /// Indeterminate tagged with an effect
    pub fn indeterminate_for(effect: Effect) -> Decision {
        match effect {
            Effect::Permit => Decision::IndeterminatePermit,
            Effect::Deny => Decision::IndeterminateDeny,
        }
    }

    /// Effect of a Permit or Deny decision
    pub fn effect(&self) -> Option<Effect> {
        match self {
            Decision::Permit => Some(Effect::Permit),
            Decision::Deny => Some(Effect::Deny),
            _ => None,
        }
    }
}

impl From<Effect> for Decision {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Permit => Decision::Permit,
            Effect::Deny => Decision::Deny,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Decision::Permit => "Permit",
            Decision::Deny => "Deny",
            Decision::NotApplicable => "NotApplicable",
            Decision::Indeterminate => "Indeterminate",
            Decision::IndeterminateDeny => "Indeterminate{D}",
            Decision::IndeterminatePermit => "Indeterminate{P}",
            Decision::IndeterminateDenyPermit => "Indeterminate{DP}",
        };
        f.write_str(name)
    }
}

/// Result of evaluating a rule, policy or policy set
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    pub decision: Decision,
    pub status: Status,
    pub obligations: Vec<Obligation>,
    pub advice: Vec<Advice>,
    /// Applicable policies, in evaluation order
    pub policy_identifiers: Vec<PolicyIdentifier>,
}

impl EvaluationResult {
    pub fn new(decision: Decision) -> Self {
        Self {
            decision,
            status: Status::ok(),
            obligations: Vec::new(),
            advice: Vec::new(),
            policy_identifiers: Vec::new(),
        }
    }

    pub fn with_status(decision: Decision, status: Status) -> Self {
        Self {
            status,
            ..Self::new(decision)
        }
    }

    pub fn not_applicable() -> Self {
        Self::new(Decision::NotApplicable)
    }

    pub fn indeterminate(decision: Decision, status: Status) -> Self {
        debug_assert!(decision.is_indeterminate());
        Self::with_status(decision, status)
    }

    pub fn is_applicable(&self) -> bool {
        self.decision != Decision::NotApplicable
    }

    /// Take over another result's obligations, advice and policy ids
    pub fn merge(&mut self, other: EvaluationResult) {
        self.obligations.extend(other.obligations);
        self.advice.extend(other.advice);
        self.policy_identifiers.extend(other.policy_identifiers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse() {
        assert_eq!(Decision::IndeterminateDenyPermit.collapse(), Decision::Indeterminate);
        assert_eq!(Decision::Permit.collapse(), Decision::Permit);
        assert_eq!(Decision::NotApplicable.collapse(), Decision::NotApplicable);
    }

    #[test]
    fn test_display_extended_forms() {
        assert_eq!(Decision::IndeterminateDeny.to_string(), "Indeterminate{D}");
        assert_eq!(Decision::indeterminate_for(Effect::Permit), Decision::IndeterminatePermit);
    }
}
