//! Combining algorithm lookup by URN

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    CombiningAlgorithm, DenyOverrides, DenyUnlessPermit, FirstApplicable, OnlyOneApplicable, PermitOverrides,
    PermitUnlessDeny,
};
use crate::identifier::{self, Identifier};
use crate::policy::{PolicySetChild, Rule};

pub type RuleCombiningAlgorithm = Arc<dyn CombiningAlgorithm<Rule>>;
pub type PolicyCombiningAlgorithm = Arc<dyn CombiningAlgorithm<PolicySetChild>>;

static STANDARD: Lazy<Arc<CombiningAlgorithmRegistry>> = Lazy::new(|| Arc::new(CombiningAlgorithmRegistry::new()));

/// Rule and policy combining algorithms keyed by identifier
#[derive(Debug, Clone)]
pub struct CombiningAlgorithmRegistry {
    rule_algorithms: HashMap<Identifier, RuleCombiningAlgorithm>,
    policy_algorithms: HashMap<Identifier, PolicyCombiningAlgorithm>,
}

impl Default for CombiningAlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CombiningAlgorithmRegistry {
    /// Registry holding every standard algorithm
    pub fn new() -> Self {
        let rule_algorithms: Vec<RuleCombiningAlgorithm> = vec![
            Arc::new(DenyOverrides::new(identifier::RULE_DENY_OVERRIDES)),
            Arc::new(DenyOverrides::new(identifier::RULE_ORDERED_DENY_OVERRIDES)),
            Arc::new(PermitOverrides::new(identifier::RULE_PERMIT_OVERRIDES)),
            Arc::new(PermitOverrides::new(identifier::RULE_ORDERED_PERMIT_OVERRIDES)),
            Arc::new(FirstApplicable::new(identifier::RULE_FIRST_APPLICABLE)),
            Arc::new(DenyUnlessPermit::new(identifier::RULE_DENY_UNLESS_PERMIT)),
            Arc::new(PermitUnlessDeny::new(identifier::RULE_PERMIT_UNLESS_DENY)),
        ];
        let policy_algorithms: Vec<PolicyCombiningAlgorithm> = vec![
            Arc::new(DenyOverrides::new(identifier::POLICY_DENY_OVERRIDES)),
            Arc::new(DenyOverrides::new(identifier::POLICY_ORDERED_DENY_OVERRIDES)),
            Arc::new(PermitOverrides::new(identifier::POLICY_PERMIT_OVERRIDES)),
            Arc::new(PermitOverrides::new(identifier::POLICY_ORDERED_PERMIT_OVERRIDES)),
            Arc::new(FirstApplicable::new(identifier::POLICY_FIRST_APPLICABLE)),
            Arc::new(OnlyOneApplicable::new(identifier::POLICY_ONLY_ONE_APPLICABLE)),
            Arc::new(DenyUnlessPermit::new(identifier::POLICY_DENY_UNLESS_PERMIT)),
            Arc::new(PermitUnlessDeny::new(identifier::POLICY_PERMIT_UNLESS_DENY)),
        ];

        Self {
            rule_algorithms: rule_algorithms.into_iter().map(|a| (a.id().clone(), a)).collect(),
            policy_algorithms: policy_algorithms.into_iter().map(|a| (a.id().clone(), a)).collect(),
        }
    }

    /// Shared instance of the standard registry
    pub fn standard() -> Arc<CombiningAlgorithmRegistry> {
        Arc::clone(&STANDARD)
    }

    pub fn rule_algorithm(&self, id: &Identifier) -> Option<RuleCombiningAlgorithm> {
        self.rule_algorithms.get(id).cloned()
    }

    pub fn policy_algorithm(&self, id: &Identifier) -> Option<PolicyCombiningAlgorithm> {
        self.policy_algorithms.get(id).cloned()
    }

    pub fn register_rule_algorithm(&mut self, algorithm: RuleCombiningAlgorithm) {
        self.rule_algorithms.insert(algorithm.id().clone(), algorithm);
    }

    pub fn register_policy_algorithm(&mut self, algorithm: PolicyCombiningAlgorithm) {
        self.policy_algorithms.insert(algorithm.id().clone(), algorithm);
    }
}
