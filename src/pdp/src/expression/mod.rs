//! Expression tree
//!
//! Expressions are the leaves and inner nodes of conditions, matches,
//! variable definitions and attribute assignments. Evaluating one yields an
//! [`ExpressionResult`]: a status plus either a single value or a bag.
//!
//! # Variants
//!
//! - literal attribute values
//! - attribute designators (request first, then the attribute resolver chain)
//! - attribute selectors (JSON Pointer over per-category request content)
//! - variable references, bound to definitions when a policy is built
//! - function application

pub mod apply;
pub mod designator;
pub mod result;
pub mod selector;
pub mod variable;

use std::collections::HashMap;
use std::sync::Arc;

use crate::datatypes::AttributeValue;
use crate::error::EvaluationError;
use crate::eval::EvaluationContext;
use crate::policy::PolicyDefaults;

pub use apply::Apply;
pub use designator::AttributeDesignator;
pub use result::{ExpressionResult, ExpressionValue};
pub use selector::AttributeSelector;
pub use variable::{VariableDefinition, VariableReference};

/// A node of the expression language
#[derive(Debug, Clone)]
pub enum Expression {
    Literal(AttributeValue),
    AttributeDesignator(AttributeDesignator),
    AttributeSelector(AttributeSelector),
    VariableReference(VariableReference),
    Apply(Apply),
}

impl Expression {
    /// Evaluate against a request context.
    ///
    /// Missing or malformed data is reported through the result's status;
    /// `Err` is reserved for failures that abort the expression itself.
    pub fn evaluate(
        &self,
        context: &dyn EvaluationContext,
        defaults: Option<&PolicyDefaults>,
    ) -> Result<ExpressionResult, EvaluationError> {
        match self {
            Expression::Literal(value) => Ok(ExpressionResult::single(value.clone())),
            Expression::AttributeDesignator(designator) => Ok(designator.evaluate(context)),
            Expression::AttributeSelector(selector) => selector.evaluate(context, defaults),
            Expression::VariableReference(reference) => reference.evaluate(context, defaults),
            Expression::Apply(apply) => apply.evaluate(context, defaults),
        }
    }

    /// Bind every variable reference in this tree to its definition.
    ///
    /// Ids with no definition are appended to `unresolved`.
    pub fn bind_variables(
        &mut self,
        definitions: &HashMap<String, Arc<VariableDefinition>>,
        unresolved: &mut Vec<String>,
    ) {
        match self {
            Expression::VariableReference(reference) => match definitions.get(&reference.variable_id) {
                Some(definition) => reference.definition = Some(Arc::clone(definition)),
                None => unresolved.push(reference.variable_id.clone()),
            },
            Expression::Apply(apply) => {
                for argument in &mut apply.arguments {
                    argument.bind_variables(definitions, unresolved);
                }
            }
            _ => {}
        }
    }
}

impl From<AttributeValue> for Expression {
    fn from(value: AttributeValue) -> Self {
        Expression::Literal(value)
    }
}

impl From<AttributeDesignator> for Expression {
    fn from(designator: AttributeDesignator) -> Self {
        Expression::AttributeDesignator(designator)
    }
}

impl From<AttributeSelector> for Expression {
    fn from(selector: AttributeSelector) -> Self {
        Expression::AttributeSelector(selector)
    }
}

impl From<VariableReference> for Expression {
    fn from(reference: VariableReference) -> Self {
        Expression::VariableReference(reference)
    }
}

impl From<Apply> for Expression {
    fn from(apply: Apply) -> Self {
        Expression::Apply(apply)
    }
}
