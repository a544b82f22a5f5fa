use super::{Expression, ExpressionResult};
use crate::error::EvaluationError;
use crate::eval::EvaluationContext;
use crate::function::{FunctionArgument, FunctionArgumentExpression};
use crate::identifier::Identifier;
use crate::policy::PolicyDefaults;

/// Application of a function to argument expressions.
///
/// Arguments are handed to the function unevaluated; each is evaluated the
/// first time the function looks at it.
#[derive(Debug, Clone)]
pub struct Apply {
    pub function_id: Identifier,
    pub description: Option<String>,
    pub arguments: Vec<Expression>,
}

impl Apply {
    pub fn new(function_id: Identifier, arguments: Vec<Expression>) -> Self {
        Self {
            function_id,
            description: None,
            arguments,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn evaluate(
        &self,
        context: &dyn EvaluationContext,
        defaults: Option<&PolicyDefaults>,
    ) -> Result<ExpressionResult, EvaluationError> {
        let function = context.function(&self.function_id).ok_or_else(|| {
            EvaluationError::Processing(format!("Unknown function \"{}\"", self.function_id))
        })?;

        let bound: Vec<FunctionArgumentExpression<'_>> = self
            .arguments
            .iter()
            .map(|expression| FunctionArgumentExpression::new(expression, context, defaults))
            .collect();
        let arguments: Vec<&dyn FunctionArgument> =
            bound.iter().map(|argument| argument as &dyn FunctionArgument).collect();

        Ok(function.evaluate(context, &arguments))
    }
}
