//! Bag functions: `*-one-and-only`, `*-bag-size`, `*-is-in`, `*-bag`

use std::marker::PhantomData;
use std::sync::Arc;

use super::{function_error, processing_error, Arity, ConvertedArgument, FunctionArgument, FunctionDefinition, FunctionRegistry};
use crate::bag::Bag;
use crate::datatypes::{
    AttributeValue, DataType, DataTypeAnyUri, DataTypeBoolean, DataTypeDate, DataTypeDateTime, DataTypeDouble,
    DataTypeInteger, DataTypeString,
};
use crate::eval::EvaluationContext;
use crate::expression::ExpressionResult;
use crate::identifier::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BagOp {
    OneAndOnly,
    Size,
    IsIn,
    Bag,
}

impl BagOp {
    fn suffix(&self) -> &'static str {
        match self {
            BagOp::OneAndOnly => "one-and-only",
            BagOp::Size => "bag-size",
            BagOp::IsIn => "is-in",
            BagOp::Bag => "bag",
        }
    }

    fn arity(&self) -> Arity {
        match self {
            BagOp::OneAndOnly | BagOp::Size => Arity::Exact(1),
            BagOp::IsIn => Arity::Exact(2),
            BagOp::Bag => Arity::AtLeast(0),
        }
    }
}

/// Bag function over members of data type `T`
pub struct FunctionDefinitionBag<T: DataType> {
    id: Identifier,
    op: BagOp,
    _data_type: PhantomData<fn() -> T>,
}

impl<T: DataType> FunctionDefinitionBag<T> {
    pub fn new(op: BagOp) -> Self {
        Self {
            id: Identifier::function_v1(&format!("{}-{}", T::short_name(), op.suffix())),
            op,
            _data_type: PhantomData,
        }
    }

    fn evaluate_op(&self, arguments: &[&dyn FunctionArgument]) -> Result<ExpressionResult, ExpressionResult> {
        let short_id = self.short_id();
        self.op.arity().check(short_id, arguments.len())?;
        let error = |status| function_error(short_id, &status);

        match self.op {
            BagOp::OneAndOnly => {
                let bag = ConvertedArgument::<T>::new(Some(arguments[0]), true);
                let values = bag.bag_values().map_err(error)?;
                match values.as_slice() {
                    [single] => T::create_attribute_value(single.clone())
                        .map(ExpressionResult::single)
                        .map_err(|e| processing_error(short_id, e.status_message())),
                    _ => Err(processing_error(
                        short_id,
                        format!("Expected 1 but Bag has {} elements", values.len()),
                    )),
                }
            }
            BagOp::Size => {
                let bag = ConvertedArgument::<T>::new(Some(arguments[0]), true);
                let size = bag.bag().map_or(0, Bag::size);
                if !bag.is_ok() {
                    return Err(error(bag.status().clone()));
                }
                Ok(ExpressionResult::single(AttributeValue::integer(size as i64)))
            }
            BagOp::IsIn => {
                let needle = ConvertedArgument::<T>::new(Some(arguments[0]), false)
                    .into_value()
                    .map_err(error)?;
                let values = ConvertedArgument::<T>::new(Some(arguments[1]), true)
                    .bag_values()
                    .map_err(error)?;
                Ok(ExpressionResult::single(AttributeValue::boolean(values.contains(&needle))))
            }
            BagOp::Bag => {
                let mut bag = Bag::new();
                for argument in arguments {
                    let value = ConvertedArgument::<T>::new(Some(*argument), false)
                        .into_value()
                        .map_err(error)?;
                    let value =
                        T::create_attribute_value(value).map_err(|e| processing_error(short_id, e.status_message()))?;
                    bag.add(value);
                }
                Ok(ExpressionResult::bag(bag))
            }
        }
    }
}

impl<T: DataType> FunctionDefinition for FunctionDefinitionBag<T> {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn data_type_id(&self) -> Identifier {
        match self.op {
            BagOp::OneAndOnly | BagOp::Bag => T::id(),
            BagOp::Size => DataTypeInteger::id(),
            BagOp::IsIn => DataTypeBoolean::id(),
        }
    }

    fn returns_bag(&self) -> bool {
        self.op == BagOp::Bag
    }

    fn evaluate(&self, _context: &dyn EvaluationContext, arguments: &[&dyn FunctionArgument]) -> ExpressionResult {
        match self.evaluate_op(arguments) {
            Ok(result) | Err(result) => result,
        }
    }
}

fn register_type<T: DataType>(registry: &mut FunctionRegistry) {
    for op in [BagOp::OneAndOnly, BagOp::Size, BagOp::IsIn, BagOp::Bag] {
        registry.register(Arc::new(FunctionDefinitionBag::<T>::new(op)));
    }
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    register_type::<DataTypeString>(registry);
    register_type::<DataTypeBoolean>(registry);
    register_type::<DataTypeInteger>(registry);
    register_type::<DataTypeDouble>(registry);
    register_type::<DataTypeDate>(registry);
    register_type::<DataTypeDateTime>(registry);
    register_type::<DataTypeAnyUri>(registry);
}
