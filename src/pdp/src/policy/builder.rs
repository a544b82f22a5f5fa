//! Builders for rules, policies and policy sets
//!
//! Builders are the construction path for policy trees, used by policy
//! loaders. Every builder carries a [`ParseMode`]:
//!
//! - **Strict**: a repeated optional section (description, issuer, target,
//!   policy defaults, obligation expressions, advice expressions), an unknown
//!   combining algorithm or an unresolved variable reference fails the build.
//! - **Lenient**: the problem is logged with `warn!`; the first occurrence of
//!   a section is kept, an unknown algorithm is left unset and an unresolved
//!   variable reference is left unbound.
//!
//! # Example
//!
//! ```rust
//! use cretoai_pdp::identifier;
//! use cretoai_pdp::policy::{Effect, ParseMode, PolicyBuilder, RuleBuilder};
//!
//! let rule = RuleBuilder::new("permit-all", Effect::Permit, ParseMode::Strict).build().unwrap();
//! let policy = PolicyBuilder::new("urn:example:policy", ParseMode::Strict)
//!     .combining_algorithm(&identifier::RULE_DENY_OVERRIDES)
//!     .unwrap()
//!     .rule(rule)
//!     .build()
//!     .unwrap();
//! assert_eq!(policy.rules.len(), 1);
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::{
    AdviceExpression, CombinerParameter, Effect, IdReference, ObligationExpression, ParseMode, Policy, PolicyDef,
    PolicyDefaults, PolicySet, PolicySetChild, Rule, Target, Version,
};
use crate::combining::CombiningAlgorithmRegistry;
use crate::error::{PdpError, Result};
use crate::expression::{Expression, VariableDefinition};
use crate::identifier::Identifier;

/// Store `value` unless the section was already set
fn set_once<T>(slot: &mut Option<T>, value: T, section: &str, owner: &str, mode: ParseMode) -> Result<()> {
    if slot.is_none() {
        *slot = Some(value);
        return Ok(());
    }
    match mode {
        ParseMode::Strict => Err(PdpError::Syntax(format!("Duplicate {} in \"{}\"", section, owner))),
        ParseMode::Lenient => {
            warn!("Ignoring duplicate {} in \"{}\"", section, owner);
            Ok(())
        }
    }
}

fn scoped_defaults(path_version: &Option<Identifier>, parent: &Option<Arc<PolicyDefaults>>) -> Option<Arc<PolicyDefaults>> {
    match (path_version, parent) {
        (None, None) => None,
        (None, Some(parent)) => Some(Arc::clone(parent)),
        (Some(path_version), parent) => Some(Arc::new(PolicyDefaults::new(Some(path_version.clone()), parent.clone()))),
    }
}

/// Report variable references with no definition
fn check_unresolved(unresolved: Vec<String>, policy_id: &Identifier, mode: ParseMode) -> Result<()> {
    for variable_id in unresolved {
        match mode {
            ParseMode::Strict => {
                return Err(PdpError::UnknownVariable {
                    policy_id: policy_id.clone(),
                    variable_id,
                })
            }
            ParseMode::Lenient => warn!("Unknown variable \"{}\" in policy \"{}\"", variable_id, policy_id),
        }
    }
    Ok(())
}

fn bind_obligations(
    obligations: &mut [ObligationExpression],
    advice: &mut [AdviceExpression],
    definitions: &HashMap<String, Arc<VariableDefinition>>,
    unresolved: &mut Vec<String>,
) {
    let assignments = obligations
        .iter_mut()
        .flat_map(|o| o.assignments.iter_mut())
        .chain(advice.iter_mut().flat_map(|a| a.assignments.iter_mut()));
    for assignment in assignments {
        assignment.expression.bind_variables(definitions, unresolved);
    }
}

/// Builds a [`Rule`]
#[derive(Debug)]
pub struct RuleBuilder {
    mode: ParseMode,
    id: String,
    effect: Effect,
    description: Option<String>,
    target: Option<Target>,
    condition: Option<Expression>,
    obligation_expressions: Option<Vec<ObligationExpression>>,
    advice_expressions: Option<Vec<AdviceExpression>>,
}

impl RuleBuilder {
    pub fn new(id: impl Into<String>, effect: Effect, mode: ParseMode) -> Self {
        Self {
            mode,
            id: id.into(),
            effect,
            description: None,
            target: None,
            condition: None,
            obligation_expressions: None,
            advice_expressions: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Result<Self> {
        set_once(&mut self.description, description.into(), "description", &self.id, self.mode)?;
        Ok(self)
    }

    pub fn target(mut self, target: Target) -> Result<Self> {
        set_once(&mut self.target, target, "target", &self.id, self.mode)?;
        Ok(self)
    }

    pub fn condition(mut self, condition: impl Into<Expression>) -> Result<Self> {
        set_once(&mut self.condition, condition.into(), "condition", &self.id, self.mode)?;
        Ok(self)
    }

    pub fn obligation_expressions(mut self, obligations: Vec<ObligationExpression>) -> Result<Self> {
        set_once(&mut self.obligation_expressions, obligations, "obligation expressions", &self.id, self.mode)?;
        Ok(self)
    }

    pub fn advice_expressions(mut self, advice: Vec<AdviceExpression>) -> Result<Self> {
        set_once(&mut self.advice_expressions, advice, "advice expressions", &self.id, self.mode)?;
        Ok(self)
    }

    pub fn build(self) -> Result<Rule> {
        Ok(Rule {
            id: self.id,
            description: self.description,
            effect: self.effect,
            target: self.target.unwrap_or_default(),
            condition: self.condition,
            obligation_expressions: self.obligation_expressions.unwrap_or_default(),
            advice_expressions: self.advice_expressions.unwrap_or_default(),
        })
    }
}

/// Builds a [`Policy`]
#[derive(Debug)]
pub struct PolicyBuilder {
    mode: ParseMode,
    algorithms: Arc<CombiningAlgorithmRegistry>,
    policy: Policy,
    description: Option<String>,
    issuer: Option<String>,
    target: Option<Target>,
    path_version: Option<Identifier>,
    parent_defaults: Option<Arc<PolicyDefaults>>,
    obligation_expressions: Option<Vec<ObligationExpression>>,
    advice_expressions: Option<Vec<AdviceExpression>>,
    variables: Vec<VariableDefinition>,
}

impl PolicyBuilder {
    pub fn new(id: impl Into<Identifier>, mode: ParseMode) -> Self {
        Self {
            mode,
            algorithms: CombiningAlgorithmRegistry::standard(),
            policy: Policy::new(id.into()),
            description: None,
            issuer: None,
            target: None,
            path_version: None,
            parent_defaults: None,
            obligation_expressions: None,
            advice_expressions: None,
            variables: Vec::new(),
        }
    }

    /// Resolve algorithm ids against `algorithms` instead of the standard set
    pub fn with_algorithms(mut self, algorithms: Arc<CombiningAlgorithmRegistry>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Defaults of the enclosing policy set
    pub fn with_parent_defaults(mut self, parent: Option<Arc<PolicyDefaults>>) -> Self {
        self.parent_defaults = parent;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.policy.version = version;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Result<Self> {
        set_once(&mut self.description, description.into(), "description", self.policy.id.as_str(), self.mode)?;
        Ok(self)
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Result<Self> {
        set_once(&mut self.issuer, issuer.into(), "issuer", self.policy.id.as_str(), self.mode)?;
        Ok(self)
    }

    pub fn target(mut self, target: Target) -> Result<Self> {
        set_once(&mut self.target, target, "target", self.policy.id.as_str(), self.mode)?;
        Ok(self)
    }

    /// Path version for attribute selectors in this policy
    pub fn defaults(mut self, path_version: Identifier) -> Result<Self> {
        set_once(&mut self.path_version, path_version, "policy defaults", self.policy.id.as_str(), self.mode)?;
        Ok(self)
    }

    pub fn obligation_expressions(mut self, obligations: Vec<ObligationExpression>) -> Result<Self> {
        set_once(
            &mut self.obligation_expressions,
            obligations,
            "obligation expressions",
            self.policy.id.as_str(),
            self.mode,
        )?;
        Ok(self)
    }

    pub fn advice_expressions(mut self, advice: Vec<AdviceExpression>) -> Result<Self> {
        set_once(&mut self.advice_expressions, advice, "advice expressions", self.policy.id.as_str(), self.mode)?;
        Ok(self)
    }

    pub fn combining_algorithm(mut self, id: &Identifier) -> Result<Self> {
        match self.algorithms.rule_algorithm(id) {
            Some(algorithm) => self.policy.combining_algorithm = Some(algorithm),
            None => match self.mode {
                ParseMode::Strict => return Err(PdpError::UnknownCombiningAlgorithm(id.clone())),
                ParseMode::Lenient => warn!("Unknown rule combining algorithm \"{}\" in \"{}\"", id, self.policy.id),
            },
        }
        Ok(self)
    }

    pub fn combiner_parameter(mut self, parameter: CombinerParameter) -> Self {
        self.policy.combiner_parameters.push(parameter);
        self
    }

    pub fn rule_combiner_parameter(mut self, rule_id: impl Into<String>, parameter: CombinerParameter) -> Self {
        self.policy
            .rule_combiner_parameters
            .entry(rule_id.into())
            .or_default()
            .push(parameter);
        self
    }

    /// Definitions may reference only variables defined before them
    pub fn variable(mut self, definition: VariableDefinition) -> Self {
        self.variables.push(definition);
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.policy.rules.push(rule);
        self
    }

    /// Defaults the built policy will use, for building nested elements
    pub fn scoped_defaults(&self) -> Option<Arc<PolicyDefaults>> {
        scoped_defaults(&self.path_version, &self.parent_defaults)
    }

    pub fn build(self) -> Result<Policy> {
        let mode = self.mode;
        let defaults = self.scoped_defaults();
        let mut policy = self.policy;
        policy.description = self.description;
        policy.issuer = self.issuer;
        policy.target = self.target.unwrap_or_default();
        policy.defaults = defaults;
        policy.obligation_expressions = self.obligation_expressions.unwrap_or_default();
        policy.advice_expressions = self.advice_expressions.unwrap_or_default();

        // Bind variables in declaration order
        let mut definitions: HashMap<String, Arc<VariableDefinition>> = HashMap::new();
        for mut definition in self.variables {
            if definitions.contains_key(&definition.id) {
                match mode {
                    ParseMode::Strict => {
                        return Err(PdpError::Syntax(format!(
                            "Duplicate variable \"{}\" in \"{}\"",
                            definition.id, policy.id
                        )))
                    }
                    ParseMode::Lenient => {
                        warn!("Ignoring duplicate variable \"{}\" in \"{}\"", definition.id, policy.id);
                        continue;
                    }
                }
            }
            let mut unresolved = Vec::new();
            definition.expression.bind_variables(&definitions, &mut unresolved);
            check_unresolved(unresolved, &policy.id, mode)?;

            let definition = Arc::new(definition);
            definitions.insert(definition.id.clone(), Arc::clone(&definition));
            policy.variables.push(definition);
        }

        let mut unresolved = Vec::new();
        for rule in &mut policy.rules {
            if let Some(condition) = rule.condition.as_mut() {
                condition.bind_variables(&definitions, &mut unresolved);
            }
            bind_obligations(
                &mut rule.obligation_expressions,
                &mut rule.advice_expressions,
                &definitions,
                &mut unresolved,
            );
        }
        bind_obligations(
            &mut policy.obligation_expressions,
            &mut policy.advice_expressions,
            &definitions,
            &mut unresolved,
        );
        check_unresolved(unresolved, &policy.id, mode)?;

        Ok(policy)
    }
}

/// Builds a [`PolicySet`]
#[derive(Debug)]
pub struct PolicySetBuilder {
    mode: ParseMode,
    algorithms: Arc<CombiningAlgorithmRegistry>,
    policy_set: PolicySet,
    description: Option<String>,
    issuer: Option<String>,
    target: Option<Target>,
    path_version: Option<Identifier>,
    parent_defaults: Option<Arc<PolicyDefaults>>,
    obligation_expressions: Option<Vec<ObligationExpression>>,
    advice_expressions: Option<Vec<AdviceExpression>>,
}

impl PolicySetBuilder {
    pub fn new(id: impl Into<Identifier>, mode: ParseMode) -> Self {
        Self {
            mode,
            algorithms: CombiningAlgorithmRegistry::standard(),
            policy_set: PolicySet::new(id.into()),
            description: None,
            issuer: None,
            target: None,
            path_version: None,
            parent_defaults: None,
            obligation_expressions: None,
            advice_expressions: None,
        }
    }

    pub fn with_algorithms(mut self, algorithms: Arc<CombiningAlgorithmRegistry>) -> Self {
        self.algorithms = algorithms;
        self
    }

    pub fn with_parent_defaults(mut self, parent: Option<Arc<PolicyDefaults>>) -> Self {
        self.parent_defaults = parent;
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.policy_set.version = version;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Result<Self> {
        set_once(&mut self.description, description.into(), "description", self.policy_set.id.as_str(), self.mode)?;
        Ok(self)
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Result<Self> {
        set_once(&mut self.issuer, issuer.into(), "issuer", self.policy_set.id.as_str(), self.mode)?;
        Ok(self)
    }

    pub fn target(mut self, target: Target) -> Result<Self> {
        set_once(&mut self.target, target, "target", self.policy_set.id.as_str(), self.mode)?;
        Ok(self)
    }

    pub fn defaults(mut self, path_version: Identifier) -> Result<Self> {
        set_once(&mut self.path_version, path_version, "policy set defaults", self.policy_set.id.as_str(), self.mode)?;
        Ok(self)
    }

    pub fn obligation_expressions(mut self, obligations: Vec<ObligationExpression>) -> Result<Self> {
        set_once(
            &mut self.obligation_expressions,
            obligations,
            "obligation expressions",
            self.policy_set.id.as_str(),
            self.mode,
        )?;
        Ok(self)
    }

    pub fn advice_expressions(mut self, advice: Vec<AdviceExpression>) -> Result<Self> {
        set_once(
            &mut self.advice_expressions,
            advice,
            "advice expressions",
            self.policy_set.id.as_str(),
            self.mode,
        )?;
        Ok(self)
    }

    pub fn combining_algorithm(mut self, id: &Identifier) -> Result<Self> {
        match self.algorithms.policy_algorithm(id) {
            Some(algorithm) => self.policy_set.combining_algorithm = Some(algorithm),
            None => match self.mode {
                ParseMode::Strict => return Err(PdpError::UnknownCombiningAlgorithm(id.clone())),
                ParseMode::Lenient => {
                    warn!("Unknown policy combining algorithm \"{}\" in \"{}\"", id, self.policy_set.id)
                }
            },
        }
        Ok(self)
    }

    pub fn combiner_parameter(mut self, parameter: CombinerParameter) -> Self {
        self.policy_set.combiner_parameters.push(parameter);
        self
    }

    pub fn policy_combiner_parameter(mut self, policy_id: impl Into<Identifier>, parameter: CombinerParameter) -> Self {
        self.policy_set
            .policy_combiner_parameters
            .entry(policy_id.into())
            .or_default()
            .push(parameter);
        self
    }

    pub fn policy(self, policy: Policy) -> Self {
        self.child(PolicyDef::Policy(policy).into())
    }

    pub fn policy_set(self, policy_set: PolicySet) -> Self {
        self.child(PolicyDef::PolicySet(policy_set).into())
    }

    pub fn policy_reference(self, reference: IdReference) -> Self {
        self.child(PolicySetChild::PolicyIdReference(reference))
    }

    pub fn policy_set_reference(self, reference: IdReference) -> Self {
        self.child(PolicySetChild::PolicySetIdReference(reference))
    }

    pub fn child(mut self, child: PolicySetChild) -> Self {
        self.policy_set.children.push(child);
        self
    }

    /// Defaults the built policy set will use; pass to nested builders
    /// through `with_parent_defaults`
    pub fn scoped_defaults(&self) -> Option<Arc<PolicyDefaults>> {
        scoped_defaults(&self.path_version, &self.parent_defaults)
    }

    pub fn build(self) -> Result<PolicySet> {
        let defaults = self.scoped_defaults();
        let mut policy_set = self.policy_set;
        policy_set.description = self.description;
        policy_set.issuer = self.issuer;
        policy_set.target = self.target.unwrap_or_default();
        policy_set.defaults = defaults;
        policy_set.obligation_expressions = self.obligation_expressions.unwrap_or_default();
        policy_set.advice_expressions = self.advice_expressions.unwrap_or_default();
        Ok(policy_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{Apply, VariableReference};
    use crate::identifier::{FUNCTION_NOT, PATH_VERSION_JSON_POINTER, RULE_DENY_OVERRIDES};
    use crate::datatypes::AttributeValue;

    #[test]
    fn test_strict_rejects_duplicate_description() {
        let result = PolicyBuilder::new("urn:test:policy", ParseMode::Strict)
            .description("first")
            .and_then(|b| b.description("second"));
        assert!(matches!(result, Err(PdpError::Syntax(_))));
    }

    #[test]
    fn test_lenient_keeps_first_occurrence() {
        let policy = PolicyBuilder::new("urn:test:policy", ParseMode::Lenient)
            .description("first")
            .and_then(|b| b.description("second"))
            .and_then(|b| b.build())
            .unwrap();
        assert_eq!(policy.description.as_deref(), Some("first"));
    }

    #[test]
    fn test_unknown_algorithm() {
        let unknown = Identifier::new("urn:test:no-such-algorithm");

        let strict = PolicyBuilder::new("urn:test:policy", ParseMode::Strict).combining_algorithm(&unknown);
        assert!(matches!(strict, Err(PdpError::UnknownCombiningAlgorithm(_))));

        let lenient = PolicyBuilder::new("urn:test:policy", ParseMode::Lenient)
            .combining_algorithm(&unknown)
            .and_then(|b| b.build())
            .unwrap();
        assert!(lenient.combining_algorithm.is_none());
    }

    #[test]
    fn test_variables_bind_in_declaration_order() {
        let policy = PolicyBuilder::new("urn:test:policy", ParseMode::Strict)
            .variable(VariableDefinition::new("flag", AttributeValue::boolean(false)))
            .variable(VariableDefinition::new(
                "negated",
                Apply::new(FUNCTION_NOT, vec![VariableReference::new("flag").into()]),
            ))
            .rule(
                RuleBuilder::new("r", Effect::Permit, ParseMode::Strict)
                    .condition(VariableReference::new("negated"))
                    .and_then(|b| b.build())
                    .unwrap(),
            )
            .combining_algorithm(&RULE_DENY_OVERRIDES)
            .and_then(|b| b.build())
            .unwrap();

        assert_eq!(policy.variables.len(), 2);
        match &policy.rules[0].condition {
            Some(Expression::VariableReference(reference)) => assert!(reference.is_bound()),
            other => panic!("unexpected condition {:?}", other),
        }
    }

    #[test]
    fn test_forward_variable_reference() {
        let builder = PolicyBuilder::new("urn:test:policy", ParseMode::Strict)
            .variable(VariableDefinition::new("early", VariableReference::new("late")))
            .variable(VariableDefinition::new("late", AttributeValue::boolean(true)));
        assert!(matches!(builder.build(), Err(PdpError::UnknownVariable { .. })));
    }

    #[test]
    fn test_defaults_inherited_from_policy_set() {
        let set_builder = PolicySetBuilder::new("urn:test:set", ParseMode::Strict)
            .defaults(PATH_VERSION_JSON_POINTER)
            .unwrap();
        let policy = PolicyBuilder::new("urn:test:policy", ParseMode::Strict)
            .with_parent_defaults(set_builder.scoped_defaults())
            .build()
            .unwrap();

        let defaults = policy.defaults.as_deref().unwrap();
        assert_eq!(defaults.path_version(), Some(&PATH_VERSION_JSON_POINTER));

        let set = set_builder.policy(policy).build().unwrap();
        assert_eq!(set.children.len(), 1);
    }
}
