use std::sync::Arc;

use super::{Expression, ExpressionResult};
use crate::error::EvaluationError;
use crate::eval::EvaluationContext;
use crate::policy::PolicyDefaults;

/// A named expression scoped to one policy
#[derive(Debug, Clone)]
pub struct VariableDefinition {
    pub id: String,
    pub expression: Expression,
}

impl VariableDefinition {
    pub fn new(id: impl Into<String>, expression: impl Into<Expression>) -> Self {
        Self {
            id: id.into(),
            expression: expression.into(),
        }
    }
}

/// Reference to a [`VariableDefinition`] by id
#[derive(Debug, Clone)]
pub struct VariableReference {
    pub variable_id: String,
    pub(crate) definition: Option<Arc<VariableDefinition>>,
}

impl VariableReference {
    pub fn new(variable_id: impl Into<String>) -> Self {
        Self {
            variable_id: variable_id.into(),
            definition: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.definition.is_some()
    }

    pub fn evaluate(
        &self,
        context: &dyn EvaluationContext,
        defaults: Option<&PolicyDefaults>,
    ) -> Result<ExpressionResult, EvaluationError> {
        match &self.definition {
            Some(definition) => definition.expression.evaluate(context, defaults),
            None => Err(EvaluationError::Processing(format!(
                "Unknown variable \"{}\"",
                self.variable_id
            ))),
        }
    }
}
