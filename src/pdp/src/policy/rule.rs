use tracing::debug;

use super::obligation::evaluate_for_effect;
use super::{AdviceExpression, Effect, MatchResult, ObligationExpression, PolicyDefaults, Target};
use crate::combining::Combinable;
use crate::datatypes::Value;
use crate::eval::{Decision, EvaluationContext, EvaluationResult};
use crate::expression::Expression;
use crate::status::Status;
use crate::trace::TraceEvent;

/// A rule: target, optional condition, effect
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub description: Option<String>,
    pub effect: Effect,
    pub target: Target,
    pub condition: Option<Expression>,
    pub obligation_expressions: Vec<ObligationExpression>,
    pub advice_expressions: Vec<AdviceExpression>,
}

impl Rule {
    pub fn new(id: impl Into<String>, effect: Effect) -> Self {
        Self {
            id: id.into(),
            description: None,
            effect,
            target: Target::default(),
            condition: None,
            obligation_expressions: Vec::new(),
            advice_expressions: Vec::new(),
        }
    }

    fn indeterminate(&self, status: Status) -> EvaluationResult {
        EvaluationResult::indeterminate(Decision::indeterminate_for(self.effect), status)
    }

    /// `Ok(true)` when the condition holds or is absent
    fn evaluate_condition(
        &self,
        context: &dyn EvaluationContext,
        defaults: Option<&PolicyDefaults>,
    ) -> Result<bool, Status> {
        let Some(condition) = &self.condition else {
            return Ok(true);
        };
        let result = condition
            .evaluate(context, defaults)
            .map_err(|e| Status::processing_error(e.to_string()))?;
        if !result.is_ok() {
            return Err(result.status().clone());
        }
        match result.value().map(|value| &value.value) {
            Some(Value::Boolean(holds)) if !result.is_bag() => Ok(*holds),
            _ => Err(Status::processing_error(format!(
                "Condition of rule \"{}\" did not evaluate to a boolean",
                self.id
            ))),
        }
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> EvaluationResult {
        let result = self.decide(context, defaults);
        if context.is_tracing() {
            context.trace(TraceEvent::new(
                context.request_id(),
                self.id.clone(),
                format!("Rule evaluated to {}", result.decision),
            ));
        }
        result
    }

    fn decide(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> EvaluationResult {
        // Step 1: Target
        match self.target.evaluate(context, defaults) {
            MatchResult::Match => {}
            MatchResult::NoMatch => return EvaluationResult::not_applicable(),
            MatchResult::Indeterminate(status) => return self.indeterminate(status),
        }

        // Step 2: Condition
        match self.evaluate_condition(context, defaults) {
            Ok(true) => {}
            Ok(false) => return EvaluationResult::not_applicable(),
            Err(status) => return self.indeterminate(status),
        }

        // Step 3: Obligations and advice for the effect
        match evaluate_for_effect(
            self.effect,
            &self.obligation_expressions,
            &self.advice_expressions,
            context,
            defaults,
        ) {
            Ok((obligations, advice)) => {
                debug!("Rule {} decided {:?}", self.id, self.effect);
                let mut result = EvaluationResult::new(self.effect.into());
                result.obligations = obligations;
                result.advice = advice;
                result
            }
            Err(status) => self.indeterminate(status),
        }
    }
}

impl Combinable for Rule {
    fn evaluate(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> EvaluationResult {
        Rule::evaluate(self, context, defaults)
    }

    fn match_target(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> MatchResult {
        self.target.evaluate(context, defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::AttributeValue;
    use crate::eval::{Request, StdEvaluationContext};
    use crate::expression::{Apply, AttributeDesignator};
    use crate::identifier::{
        CATEGORY_ACCESS_SUBJECT, DATATYPE_INTEGER, FUNCTION_INTEGER_GREATER_THAN, FUNCTION_INTEGER_ONE_AND_ONLY,
    };
    use crate::identifier::Identifier;

    fn age_over(limit: i64) -> Expression {
        let age = AttributeDesignator::new(CATEGORY_ACCESS_SUBJECT, Identifier::new("urn:test:age"), DATATYPE_INTEGER);
        Apply::new(
            FUNCTION_INTEGER_GREATER_THAN,
            vec![
                Apply::new(FUNCTION_INTEGER_ONE_AND_ONLY, vec![age.into()]).into(),
                AttributeValue::integer(limit).into(),
            ],
        )
        .into()
    }

    fn request_with_age(age: i64) -> Request {
        Request::new().with_attribute(
            CATEGORY_ACCESS_SUBJECT,
            Identifier::new("urn:test:age"),
            AttributeValue::integer(age),
        )
    }

    #[test]
    fn test_condition_true_gives_effect() {
        let mut rule = Rule::new("adults", Effect::Permit);
        rule.condition = Some(age_over(17));

        let request = request_with_age(30);
        let context = StdEvaluationContext::new(&request);
        assert_eq!(rule.evaluate(&context, None).decision, Decision::Permit);
    }

    #[test]
    fn test_condition_false_is_not_applicable() {
        let mut rule = Rule::new("adults", Effect::Permit);
        rule.condition = Some(age_over(17));

        let request = request_with_age(12);
        let context = StdEvaluationContext::new(&request);
        assert_eq!(rule.evaluate(&context, None).decision, Decision::NotApplicable);
    }

    #[test]
    fn test_condition_error_is_indeterminate_for_effect() {
        let mut rule = Rule::new("adults", Effect::Deny);
        rule.condition = Some(age_over(17));

        // No age attribute: one-and-only sees an empty bag
        let request = Request::new();
        let context = StdEvaluationContext::new(&request);
        let result = rule.evaluate(&context, None);
        assert_eq!(result.decision, Decision::IndeterminateDeny);
        assert!(!result.status.is_ok());
    }

    #[test]
    fn test_non_boolean_condition() {
        let mut rule = Rule::new("broken", Effect::Permit);
        rule.condition = Some(AttributeValue::integer(1).into());

        let request = Request::new();
        let context = StdEvaluationContext::new(&request);
        assert_eq!(rule.evaluate(&context, None).decision, Decision::IndeterminatePermit);
    }
}
