use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::obligation::evaluate_for_effect;
use super::xacml_policy::{finish_combined, with_identifier};
use super::{
    AdviceExpression, CombinerParameter, IdReference, MatchResult, ObligationExpression, PolicyDef, PolicyDefaults,
    PolicyIdentifier, ReferenceKind, Target, Version,
};
use crate::combining::{Combinable, CombiningAlgorithm, CombiningElement};
use crate::eval::{Decision, EvaluationContext, EvaluationResult};
use crate::finder::PolicyFinderResult;
use crate::identifier::Identifier;
use crate::status::Status;
use crate::trace::TraceEvent;

/// A child of a policy set
#[derive(Debug, Clone)]
pub enum PolicySetChild {
    /// Inline Policy or PolicySet
    Inline(Arc<PolicyDef>),
    PolicyIdReference(IdReference),
    PolicySetIdReference(IdReference),
}

impl PolicySetChild {
    /// Id used to key per-child combiner parameters
    pub fn id(&self) -> &Identifier {
        match self {
            PolicySetChild::Inline(policy) => policy.id(),
            PolicySetChild::PolicyIdReference(reference) | PolicySetChild::PolicySetIdReference(reference) => {
                &reference.id
            }
        }
    }

    /// The policy this child stands for, resolving references through the
    /// context's policy finder
    pub fn resolve(&self, context: &dyn EvaluationContext) -> Result<Arc<PolicyDef>, Status> {
        let (reference, kind) = match self {
            PolicySetChild::Inline(policy) => return Ok(Arc::clone(policy)),
            PolicySetChild::PolicyIdReference(reference) => (reference, ReferenceKind::Policy),
            PolicySetChild::PolicySetIdReference(reference) => (reference, ReferenceKind::PolicySet),
        };
        match context.policy(reference, kind) {
            PolicyFinderResult::Found(policy) => Ok(policy),
            PolicyFinderResult::NotFound => Err(Status::processing_error(format!(
                "Unresolved reference \"{}\"",
                reference
            ))),
            PolicyFinderResult::Error(status) => Err(status),
        }
    }
}

impl From<PolicyDef> for PolicySetChild {
    fn from(policy: PolicyDef) -> Self {
        PolicySetChild::Inline(Arc::new(policy))
    }
}

impl Combinable for PolicySetChild {
    fn evaluate(&self, context: &dyn EvaluationContext, _defaults: Option<&PolicyDefaults>) -> EvaluationResult {
        match self.resolve(context) {
            Ok(policy) => policy.evaluate(context),
            Err(status) => EvaluationResult::indeterminate(Decision::IndeterminateDenyPermit, status),
        }
    }

    fn match_target(&self, context: &dyn EvaluationContext, _defaults: Option<&PolicyDefaults>) -> MatchResult {
        match self.resolve(context) {
            Ok(policy) => policy.match_target(context),
            Err(status) => MatchResult::Indeterminate(status),
        }
    }
}

/// A policy set: a target plus policies and policy sets reduced by a
/// policy-combining algorithm
#[derive(Debug, Clone)]
pub struct PolicySet {
    pub id: Identifier,
    pub version: Version,
    pub description: Option<String>,
    pub issuer: Option<String>,
    pub target: Target,
    pub defaults: Option<Arc<PolicyDefaults>>,
    pub combining_algorithm: Option<Arc<dyn CombiningAlgorithm<PolicySetChild>>>,
    pub combiner_parameters: Vec<CombinerParameter>,
    /// Keyed by child policy id
    pub policy_combiner_parameters: HashMap<Identifier, Vec<CombinerParameter>>,
    pub children: Vec<PolicySetChild>,
    pub obligation_expressions: Vec<ObligationExpression>,
    pub advice_expressions: Vec<AdviceExpression>,
    pub load_status: Option<Status>,
}

impl PolicySet {
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
            policy_combiner_parameters: HashMap::new(),
            children: Vec::new(),
            obligation_expressions: Vec::new(),
            advice_expressions: Vec::new(),
            load_status: None,
        }
    }

    pub fn identifier(&self) -> PolicyIdentifier {
        PolicyIdentifier {
            kind: ReferenceKind::PolicySet,
            id: self.id.clone(),
            version: self.version.clone(),
        }
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext) -> EvaluationResult {
        let result = self.decide(context);
        debug!("PolicySet {} evaluated to {}", self.id, result.decision);
        if context.is_tracing() {
            context.trace(TraceEvent::new(
                context.request_id(),
                self.id.to_string(),
                format!("PolicySet evaluated to {}", result.decision),
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

        // Step 2: Combine children
        let Some(algorithm) = &self.combining_algorithm else {
            return EvaluationResult::indeterminate(
                Decision::IndeterminateDenyPermit,
                Status::processing_error("Missing combining algorithm"),
            );
        };
        let elements: Vec<CombiningElement<'_, PolicySetChild>> = self
            .children
            .iter()
            .map(|child| {
                let parameters = self
                    .policy_combiner_parameters
                    .get(child.id())
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                CombiningElement::new(child, parameters)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combining::{FirstApplicable, PermitOverrides};
    use crate::eval::{Request, StdEvaluationContext};
    use crate::finder::{PolicyFinder, StdPolicyFinder};
    use crate::identifier::{POLICY_FIRST_APPLICABLE, POLICY_PERMIT_OVERRIDES, RULE_FIRST_APPLICABLE};
    use crate::policy::{Effect, Policy, Rule};

    fn policy(id: &str, version: &str, effect: Effect) -> PolicyDef {
        let mut policy = Policy::new(Identifier::new(id));
        policy.version = version.parse().unwrap();
        policy.combining_algorithm = Some(Arc::new(FirstApplicable::new(RULE_FIRST_APPLICABLE)));
        policy.rules = vec![Rule::new("only", effect)];
        policy.into()
    }

    #[test]
    fn test_reference_resolves_highest_version() {
        let finder: Arc<dyn PolicyFinder> = Arc::new(StdPolicyFinder::new(
            Vec::new(),
            vec![
                Arc::new(policy("urn:test:shared", "1.0", Effect::Deny)),
                Arc::new(policy("urn:test:shared", "1.2", Effect::Permit)),
                Arc::new(policy("urn:test:shared", "2.0", Effect::Deny)),
            ],
        ));

        let mut set = PolicySet::new(Identifier::new("urn:test:set"));
        set.combining_algorithm = Some(Arc::new(FirstApplicable::new(POLICY_FIRST_APPLICABLE)));
        set.children = vec![PolicySetChild::PolicyIdReference(
            IdReference::new("urn:test:shared").with_version("1.*").unwrap(),
        )];

        let request = Request::new();
        let context = StdEvaluationContext::new(&request).with_policy_finder(Some(finder));
        let result = set.evaluate(&context);

        assert_eq!(result.decision, Decision::Permit);
        let versions: Vec<String> = result.policy_identifiers.iter().map(|p| p.version.to_string()).collect();
        assert_eq!(versions, vec!["1.0", "1.2"]);
    }

    #[test]
    fn test_unresolved_reference_is_indeterminate() {
        let mut set = PolicySet::new(Identifier::new("urn:test:set"));
        set.combining_algorithm = Some(Arc::new(PermitOverrides::new(POLICY_PERMIT_OVERRIDES)));
        set.children = vec![PolicySetChild::PolicySetIdReference(IdReference::new("urn:test:missing"))];

        let request = Request::new();
        let finder: Arc<dyn PolicyFinder> = Arc::new(StdPolicyFinder::default());
        let context = StdEvaluationContext::new(&request).with_policy_finder(Some(finder));
        let result = set.evaluate(&context);

        assert_eq!(result.decision, Decision::IndeterminateDenyPermit);
        assert!(result.status.message().unwrap_or_default().contains("urn:test:missing"));
    }
}
