//! Logical functions
//!
//! `and`, `or` and `n-of` look at their arguments in order and stop as soon
//! as the outcome is known, so later arguments are never evaluated.

use std::sync::Arc;

use super::{function_error, processing_error, Arity, ConvertedArgument, FunctionArgument, FunctionDefinition, FunctionRegistry};
use crate::datatypes::{AttributeValue, DataType, DataTypeBoolean, DataTypeInteger};
use crate::eval::EvaluationContext;
use crate::expression::ExpressionResult;
use crate::identifier::{self, Identifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Not,
    NOf,
}

pub struct FunctionDefinitionLogical {
    id: Identifier,
    op: LogicalOp,
}

impl FunctionDefinitionLogical {
    pub fn new(id: Identifier, op: LogicalOp) -> Self {
        Self { id, op }
    }

    fn boolean(&self, argument: &dyn FunctionArgument) -> Result<bool, ExpressionResult> {
        ConvertedArgument::<DataTypeBoolean>::new(Some(argument), false)
            .into_value()
            .map_err(|status| function_error(self.short_id(), &status))
    }

    /// True at the first argument equal to `stop_on`, else the opposite
    fn short_circuit(&self, arguments: &[&dyn FunctionArgument], stop_on: bool) -> Result<bool, ExpressionResult> {
        for argument in arguments {
            if self.boolean(*argument)? == stop_on {
                return Ok(stop_on);
            }
        }
        Ok(!stop_on)
    }

    fn n_of(&self, arguments: &[&dyn FunctionArgument]) -> Result<bool, ExpressionResult> {
        let Some((first, rest)) = arguments.split_first() else {
            return Err(processing_error(self.short_id(), "Expected at least 1 arguments, got 0"));
        };
        let needed = ConvertedArgument::<DataTypeInteger>::new(Some(*first), false)
            .into_value()
            .map_err(|status| function_error(self.short_id(), &status))?;

        if needed <= 0 {
            return Ok(true);
        }
        let needed = needed as usize;
        if needed > rest.len() {
            return Err(processing_error(
                self.short_id(),
                format!("Expected at least {} arguments but only {} provided", needed, rest.len()),
            ));
        }

        let mut found = 0;
        for (index, argument) in rest.iter().enumerate() {
            if self.boolean(*argument)? {
                found += 1;
                if found == needed {
                    return Ok(true);
                }
            }
            if needed - found > rest.len() - index - 1 {
                return Ok(false);
            }
        }
        Ok(false)
    }
}

impl FunctionDefinition for FunctionDefinitionLogical {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn data_type_id(&self) -> Identifier {
        DataTypeBoolean::id()
    }

    fn returns_bag(&self) -> bool {
        false
    }

    fn evaluate(&self, _context: &dyn EvaluationContext, arguments: &[&dyn FunctionArgument]) -> ExpressionResult {
        let outcome = match self.op {
            LogicalOp::And => self.short_circuit(arguments, false),
            LogicalOp::Or => self.short_circuit(arguments, true),
            LogicalOp::Not => Arity::Exact(1)
                .check(self.short_id(), arguments.len())
                .and_then(|()| self.boolean(arguments[0]).map(|value| !value)),
            LogicalOp::NOf => self.n_of(arguments),
        };

        match outcome {
            Ok(value) => ExpressionResult::single(AttributeValue::boolean(value)),
            Err(result) => result,
        }
    }
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(FunctionDefinitionLogical::new(identifier::FUNCTION_AND, LogicalOp::And)));
    registry.register(Arc::new(FunctionDefinitionLogical::new(identifier::FUNCTION_OR, LogicalOp::Or)));
    registry.register(Arc::new(FunctionDefinitionLogical::new(identifier::FUNCTION_NOT, LogicalOp::Not)));
    registry.register(Arc::new(FunctionDefinitionLogical::new(
        Identifier::function_v1("n-of"),
        LogicalOp::NOf,
    )));
}
