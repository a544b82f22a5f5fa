use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::obligation::evaluate_for_effect;
use super::{
    AdviceExpression, CombinerParameter, MatchResult, ObligationExpression, PolicyDefaults, PolicyIdentifier,
    ReferenceKind, Rule, Target, Version,
};
use crate::combining::{CombiningAlgorithm, CombiningElement};
use crate::eval::{Decision, EvaluationContext, EvaluationResult};
use crate::expression::VariableDefinition;
use crate::identifier::Identifier;
use crate::status::Status;
use crate::trace::TraceEvent;

/// A policy: a target plus rules reduced by a rule-combining algorithm
#[derive(Debug, Clone)]
pub struct Policy {
    pub id: Identifier,
    pub version: Version,
    pub description: Option<String>,
    pub issuer: Option<String>,
    pub target: Target,
    pub defaults: Option<Arc<PolicyDefaults>>,
    /// Unset only when a lenient build met an unknown algorithm
    pub combining_algorithm: Option<Arc<dyn CombiningAlgorithm<Rule>>>,
    pub combiner_parameters: Vec<CombinerParameter>,
    /// Keyed by rule id
    pub rule_combiner_parameters: HashMap<String, Vec<CombinerParameter>>,
    pub rules: Vec<Rule>,
    pub variables: Vec<Arc<VariableDefinition>>,
    pub obligation_expressions: Vec<ObligationExpression>,
    pub advice_expressions: Vec<AdviceExpression>,
    /// Set on placeholders for documents that failed to load
    pub load_status: Option<Status>,
}

impl Policy {
    pub fn new(id: Identifier) -> Self {
        Self {
            id,
            version: Version::default(),
            description: None,
            issuer: None,
            target: Target::default(),
            defaults: None,
            combining_algorithm: None,
            combiner_parameters: Vec::new(),
            rule_combiner_parameters: HashMap::new(),
            rules: Vec::new(),
            variables: Vec::new(),
            obligation_expressions: Vec::new(),
            advice_expressions: Vec::new(),
            load_status: None,
        }
    }

    /// Stand-in for a document that could not be loaded
    pub fn placeholder(id: Identifier, status: Status) -> Self {
        Self {
            load_status: Some(status),
            ..Self::new(id)
        }
    }

    pub fn identifier(&self) -> PolicyIdentifier {
        PolicyIdentifier {
            kind: ReferenceKind::Policy,
            id: self.id.clone(),
            version: self.version.clone(),
        }
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext) -> EvaluationResult {
        let result = self.decide(context);
        debug!("Policy {} evaluated to {}", self.id, result.decision);
        if context.is_tracing() {
            context.trace(TraceEvent::new(
                context.request_id(),
                self.id.to_string(),
                format!("Policy evaluated to {}", result.decision),
            ));
        }
        result
    }

    fn decide(&self, context: &dyn EvaluationContext) -> EvaluationResult {
        if let Some(status) = &self.load_status {
            return EvaluationResult::indeterminate(Decision::IndeterminateDenyPermit, status.clone());
        }
        let defaults = self.defaults.as_deref();

        // Step 1: Target
        let target = self.target.evaluate(context, defaults);
        if target == MatchResult::NoMatch {
            return EvaluationResult::not_applicable();
        }

        // Step 2: Combine rules
        let Some(algorithm) = &self.combining_algorithm else {
            return EvaluationResult::indeterminate(
                Decision::IndeterminateDenyPermit,
                Status::processing_error("Missing combining algorithm"),
            );
        };
        let elements: Vec<CombiningElement<'_, Rule>> = self
            .rules
            .iter()
            .map(|rule| {
                let parameters = self
                    .rule_combiner_parameters
                    .get(&rule.id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                CombiningElement::new(rule, parameters)
            })
            .collect();
        let combined = algorithm.combine(context, &elements, &self.combiner_parameters, defaults);

        // Step 3: Indeterminate target and own obligations
        let result = finish_combined(combined, target, |effect| {
            evaluate_for_effect(
                effect,
                &self.obligation_expressions,
                &self.advice_expressions,
                context,
                defaults,
            )
        });
        with_identifier(result, self.identifier())
    }
}

/// Apply the target outcome to a combined result, then append the node's own
/// obligations and advice for the decided effect.
pub(crate) fn finish_combined<F>(mut result: EvaluationResult, target: MatchResult, own: F) -> EvaluationResult
where
    F: FnOnce(super::Effect) -> Result<(Vec<super::Obligation>, Vec<super::Advice>), Status>,
{
    if let MatchResult::Indeterminate(status) = target {
        let decision = match result.decision {
            Decision::NotApplicable => return result,
            Decision::Permit | Decision::IndeterminatePermit => Decision::IndeterminatePermit,
            Decision::Deny | Decision::IndeterminateDeny => Decision::IndeterminateDeny,
            _ => Decision::IndeterminateDenyPermit,
        };
        let mut indeterminate = EvaluationResult::indeterminate(decision, status);
        indeterminate.policy_identifiers = result.policy_identifiers;
        return indeterminate;
    }

    if let Some(effect) = result.decision.effect() {
        match own(effect) {
            Ok((obligations, advice)) => {
                result.obligations.extend(obligations);
                result.advice.extend(advice);
            }
            Err(status) => {
                let mut indeterminate = EvaluationResult::indeterminate(Decision::indeterminate_for(effect), status);
                indeterminate.policy_identifiers = result.policy_identifiers;
                return indeterminate;
            }
        }
    }
    result
}

/// Record `identifier` ahead of its children when the node applied
pub(crate) fn with_identifier(mut result: EvaluationResult, identifier: PolicyIdentifier) -> EvaluationResult {
    if result.is_applicable() {
        result.policy_identifiers.insert(0, identifier);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combining::DenyOverrides;
    use crate::eval::{Request, StdEvaluationContext};
    use crate::identifier::RULE_DENY_OVERRIDES;
    use crate::policy::Effect;

    fn policy_with(rules: Vec<Rule>) -> Policy {
        let mut policy = Policy::new(Identifier::new("urn:test:policy"));
        policy.combining_algorithm = Some(Arc::new(DenyOverrides::new(RULE_DENY_OVERRIDES)));
        policy.rules = rules;
        policy
    }

    #[test]
    fn test_missing_algorithm() {
        let policy = Policy::new(Identifier::new("urn:test:policy"));
        let request = Request::new();
        let context = StdEvaluationContext::new(&request);

        let result = policy.evaluate(&context);
        assert_eq!(result.decision, Decision::IndeterminateDenyPermit);
        assert_eq!(result.status.message(), Some("Missing combining algorithm"));
    }

    #[test]
    fn test_rules_combined_and_identifier_recorded() {
        let policy = policy_with(vec![Rule::new("permit", Effect::Permit), Rule::new("deny", Effect::Deny)]);
        let request = Request::new();
        let context = StdEvaluationContext::new(&request);

        let result = policy.evaluate(&context);
        assert_eq!(result.decision, Decision::Deny);
        assert_eq!(result.policy_identifiers, vec![policy.identifier()]);
    }

    #[test]
    fn test_indeterminate_target_tags_combined_effect() {
        let combined = EvaluationResult::new(Decision::Permit);
        let result = finish_combined(
            combined,
            MatchResult::Indeterminate(Status::processing_error("target failed")),
            |_| Ok((Vec::new(), Vec::new())),
        );
        assert_eq!(result.decision, Decision::IndeterminatePermit);

        let result = finish_combined(
            EvaluationResult::not_applicable(),
            MatchResult::Indeterminate(Status::processing_error("target failed")),
            |_| Ok((Vec::new(), Vec::new())),
        );
        assert_eq!(result.decision, Decision::NotApplicable);
    }

    #[test]
    fn test_placeholder_is_indeterminate() {
        let policy = Policy::placeholder(Identifier::new("urn:test:broken"), Status::syntax_error("bad document"));
        let request = Request::new();
        let context = StdEvaluationContext::new(&request);

        let result = policy.evaluate(&context);
        assert_eq!(result.decision, Decision::IndeterminateDenyPermit);
        assert_eq!(result.status, Status::syntax_error("bad document"));
    }
}
