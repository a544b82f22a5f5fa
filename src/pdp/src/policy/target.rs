//! Targets: the applicability predicate of rules, policies and policy sets
//!
//! A [`Target`] is a conjunction of [`AnyOf`]s, each a disjunction of
//! [`AllOf`]s, each a conjunction of [`Match`]es.

use tracing::debug;

use super::PolicyDefaults;
use crate::datatypes::{AttributeValue, Value};
use crate::eval::EvaluationContext;
use crate::expression::{AttributeDesignator, AttributeSelector, Expression};
use crate::function::{short_function_id, FunctionArgument, FunctionArgumentAttributeValue};
use crate::identifier::Identifier;
use crate::status::Status;

/// Outcome of matching a target against a request
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    Match,
    NoMatch,
    Indeterminate(Status),
}

/// Folds child results: `stop` short-circuits, otherwise the first
/// indeterminate wins over `otherwise`
fn fold<I>(results: I, stop: MatchResult, otherwise: MatchResult) -> MatchResult
where
    I: IntoIterator<Item = MatchResult>,
{
    let mut indeterminate = None;
    for result in results {
        if result == stop {
            return stop;
        }
        if let MatchResult::Indeterminate(status) = result {
            indeterminate.get_or_insert(status);
        }
    }
    match indeterminate {
        Some(status) => MatchResult::Indeterminate(status),
        None => otherwise,
    }
}

/// Compares a literal against every value an attribute designator or
/// selector produces
#[derive(Debug, Clone)]
pub struct Match {
    pub match_id: Identifier,
    pub value: AttributeValue,
    pub attribute: Expression,
}

impl Match {
    pub fn designator(match_id: Identifier, value: AttributeValue, designator: AttributeDesignator) -> Self {
        Self {
            match_id,
            value,
            attribute: Expression::AttributeDesignator(designator),
        }
    }

    pub fn selector(match_id: Identifier, value: AttributeValue, selector: AttributeSelector) -> Self {
        Self {
            match_id,
            value,
            attribute: Expression::AttributeSelector(selector),
        }
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> MatchResult {
        let Some(function) = context.function(&self.match_id) else {
            return MatchResult::Indeterminate(Status::processing_error(format!(
                "Unknown match function \"{}\"",
                self.match_id
            )));
        };

        let result = match self.attribute.evaluate(context, defaults) {
            Ok(result) => result,
            Err(e) => return MatchResult::Indeterminate(Status::processing_error(e.to_string())),
        };
        if !result.is_ok() {
            return MatchResult::Indeterminate(result.status().clone());
        }
        let Some(bag) = result.bag_value() else {
            return MatchResult::Indeterminate(Status::processing_error(format!(
                "{} Match attribute did not evaluate to a bag",
                short_function_id(&self.match_id)
            )));
        };

        let literal = FunctionArgumentAttributeValue::new(self.value.clone());
        let mut indeterminate = None;
        for value in bag.iter() {
            let candidate = FunctionArgumentAttributeValue::new(value.clone());
            let arguments: [&dyn FunctionArgument; 2] = [&literal, &candidate];
            let outcome = function.evaluate(context, &arguments);
            if !outcome.is_ok() {
                indeterminate.get_or_insert_with(|| outcome.status().clone());
                continue;
            }
            match outcome.value().map(|result| &result.value) {
                Some(Value::Boolean(true)) => return MatchResult::Match,
                Some(Value::Boolean(false)) => {}
                _ => {
                    indeterminate.get_or_insert_with(|| {
                        Status::processing_error(format!(
                            "{} Match function did not return a boolean",
                            short_function_id(&self.match_id)
                        ))
                    });
                }
            }
        }

        match indeterminate {
            Some(status) => MatchResult::Indeterminate(status),
            None => MatchResult::NoMatch,
        }
    }
}

/// Conjunction of matches
#[derive(Debug, Clone, Default)]
pub struct AllOf {
    pub matches: Vec<Match>,
}

impl AllOf {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> MatchResult {
        fold(
            self.matches.iter().map(|m| m.evaluate(context, defaults)),
            MatchResult::NoMatch,
            MatchResult::Match,
        )
    }
}

/// Disjunction of [`AllOf`]s
#[derive(Debug, Clone, Default)]
pub struct AnyOf {
    pub all_ofs: Vec<AllOf>,
}

impl AnyOf {
    pub fn new(all_ofs: Vec<AllOf>) -> Self {
        Self { all_ofs }
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> MatchResult {
        if self.all_ofs.is_empty() {
            return MatchResult::Match;
        }
        fold(
            self.all_ofs.iter().map(|all_of| all_of.evaluate(context, defaults)),
            MatchResult::Match,
            MatchResult::NoMatch,
        )
    }
}

/// Applicability predicate; an empty target matches everything
#[derive(Debug, Clone, Default)]
pub struct Target {
    pub any_ofs: Vec<AnyOf>,
}

impl Target {
    pub fn new(any_ofs: Vec<AnyOf>) -> Self {
        Self { any_ofs }
    }

    /// Target with a single match
    pub fn single(m: Match) -> Self {
        Self::new(vec![AnyOf::new(vec![AllOf::new(vec![m])])])
    }

    pub fn is_empty(&self) -> bool {
        self.any_ofs.is_empty()
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> MatchResult {
        let result = fold(
            self.any_ofs.iter().map(|any_of| any_of.evaluate(context, defaults)),
            MatchResult::NoMatch,
            MatchResult::Match,
        );
        debug!("Target evaluated to {:?}", result);
        result
    }
}
