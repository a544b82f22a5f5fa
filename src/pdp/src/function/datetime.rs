//! Date and dateTime arithmetic with ISO-8601 durations

use std::marker::PhantomData;
use std::sync::Arc;

use super::{function_error, processing_error, Arity, ConvertedArgument, FunctionArgument, FunctionDefinition, FunctionRegistry};
use crate::datatypes::{
    DataType, DataTypeDate, DataTypeDateTime, DataTypeDayTimeDuration, DataTypeYearMonthDuration, DateTimeArithmetic,
    Iso8601Duration,
};
use crate::eval::EvaluationContext;
use crate::expression::ExpressionResult;
use crate::identifier::{self, Identifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeOp {
    Add,
    Subtract,
}

/// Adds or subtracts a duration of type `D` to a value of type `O`.
///
/// The first argument shares the result type; the second is the duration.
pub struct FunctionDefinitionDateTimeArithmetic<O: DataType, D: DataType> {
    id: Identifier,
    op: DateTimeOp,
    _types: PhantomData<fn() -> (O, D)>,
}

impl<O, D> FunctionDefinitionDateTimeArithmetic<O, D>
where
    O: DataType,
    O::Native: DateTimeArithmetic,
    D: DataType<Native = Iso8601Duration>,
{
    pub fn new(id: Identifier, op: DateTimeOp) -> Self {
        Self {
            id,
            op,
            _types: PhantomData,
        }
    }
}

impl<O, D> FunctionDefinition for FunctionDefinitionDateTimeArithmetic<O, D>
where
    O: DataType,
    O::Native: DateTimeArithmetic,
    D: DataType<Native = Iso8601Duration>,
{
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn data_type_id(&self) -> Identifier {
        O::id()
    }

    fn returns_bag(&self) -> bool {
        false
    }

    fn evaluate(&self, _context: &dyn EvaluationContext, arguments: &[&dyn FunctionArgument]) -> ExpressionResult {
        let short_id = self.short_id();
        if let Err(result) = Arity::Exact(2).check(short_id, arguments.len()) {
            return result;
        }

        let value = match ConvertedArgument::<O>::new(Some(arguments[0]), false).into_value() {
            Ok(value) => value,
            Err(status) => return function_error(short_id, &status),
        };
        let duration = match ConvertedArgument::<D>::new(Some(arguments[1]), false).into_value() {
            Ok(duration) => duration,
            Err(status) => return function_error(short_id, &status),
        };

        let shifted = match self.op {
            DateTimeOp::Add => value.add_duration(&duration),
            DateTimeOp::Subtract => value.subtract_duration(&duration),
        };
        let Some(shifted) = shifted else {
            return processing_error(short_id, format!("Result out of range for duration {}", duration));
        };

        match O::create_attribute_value(shifted) {
            Ok(result) => ExpressionResult::single(result),
            Err(e) => processing_error(short_id, e.status_message()),
        }
    }
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry.register(Arc::new(
        FunctionDefinitionDateTimeArithmetic::<DataTypeDateTime, DataTypeDayTimeDuration>::new(
            identifier::FUNCTION_DATETIME_ADD_DAYTIMEDURATION,
            DateTimeOp::Add,
        ),
    ));
    registry.register(Arc::new(
        FunctionDefinitionDateTimeArithmetic::<DataTypeDateTime, DataTypeDayTimeDuration>::new(
            identifier::FUNCTION_DATETIME_SUBTRACT_DAYTIMEDURATION,
            DateTimeOp::Subtract,
        ),
    ));
    registry.register(Arc::new(
        FunctionDefinitionDateTimeArithmetic::<DataTypeDateTime, DataTypeYearMonthDuration>::new(
            identifier::FUNCTION_DATETIME_ADD_YEARMONTHDURATION,
            DateTimeOp::Add,
        ),
    ));
    registry.register(Arc::new(
        FunctionDefinitionDateTimeArithmetic::<DataTypeDateTime, DataTypeYearMonthDuration>::new(
            identifier::FUNCTION_DATETIME_SUBTRACT_YEARMONTHDURATION,
            DateTimeOp::Subtract,
        ),
    ));
    registry.register(Arc::new(
        FunctionDefinitionDateTimeArithmetic::<DataTypeDate, DataTypeYearMonthDuration>::new(
            identifier::FUNCTION_DATE_ADD_YEARMONTHDURATION,
            DateTimeOp::Add,
        ),
    ));
    registry.register(Arc::new(
        FunctionDefinitionDateTimeArithmetic::<DataTypeDate, DataTypeYearMonthDuration>::new(
            identifier::FUNCTION_DATE_SUBTRACT_YEARMONTHDURATION,
            DateTimeOp::Subtract,
        ),
    ));
}
