//! Set functions over bags

use std::marker::PhantomData;
use std::sync::Arc;

use super::{function_error, processing_error, Arity, ConvertedArgument, FunctionArgument, FunctionDefinition, FunctionRegistry};
use crate::bag::Bag;
use crate::datatypes::{AttributeValue, DataType, DataTypeBoolean, DataTypeDouble, DataTypeInteger, DataTypeString};
use crate::eval::EvaluationContext;
use crate::expression::ExpressionResult;
use crate::identifier::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Intersection,
    Union,
    AtLeastOneMemberOf,
    Subset,
    SetEquals,
}

impl SetOp {
    fn suffix(&self) -> &'static str {
        match self {
            SetOp::Intersection => "intersection",
            SetOp::Union => "union",
            SetOp::AtLeastOneMemberOf => "at-least-one-member-of",
            SetOp::Subset => "subset",
            SetOp::SetEquals => "set-equals",
        }
    }

    fn returns_bag(&self) -> bool {
        matches!(self, SetOp::Intersection | SetOp::Union)
    }
}

fn distinct<N: PartialEq>(values: Vec<N>) -> Vec<N> {
    let mut unique: Vec<N> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    unique
}

fn is_subset<N: PartialEq>(a: &[N], b: &[N]) -> bool {
    a.iter().all(|value| b.contains(value))
}

/// Set function over members of data type `T`
pub struct FunctionDefinitionSet<T: DataType> {
    id: Identifier,
    op: SetOp,
    _data_type: PhantomData<fn() -> T>,
}

impl<T: DataType> FunctionDefinitionSet<T> {
    pub fn new(op: SetOp) -> Self {
        Self {
            id: Identifier::function_v1(&format!("{}-{}", T::short_name(), op.suffix())),
            op,
            _data_type: PhantomData,
        }
    }

    fn to_bag(&self, values: Vec<T::Native>) -> Result<ExpressionResult, ExpressionResult> {
        let bag = distinct(values)
            .into_iter()
            .map(T::create_attribute_value)
            .collect::<Result<Bag, _>>()
            .map_err(|e| processing_error(self.short_id(), e.status_message()))?;
        Ok(ExpressionResult::bag(bag))
    }

    fn evaluate_op(&self, arguments: &[&dyn FunctionArgument]) -> Result<ExpressionResult, ExpressionResult> {
        let short_id = self.short_id();
        let arity = if self.op == SetOp::Union { Arity::AtLeast(2) } else { Arity::Exact(2) };
        arity.check(short_id, arguments.len())?;

        let mut sets = Vec::with_capacity(arguments.len());
        for argument in arguments {
            let values = ConvertedArgument::<T>::new(Some(*argument), true)
                .bag_values()
                .map_err(|status| function_error(short_id, &status))?;
            sets.push(values);
        }

        if self.op == SetOp::Union {
            return self.to_bag(sets.into_iter().flatten().collect());
        }

        let boolean = |value: bool| Ok(ExpressionResult::single(AttributeValue::boolean(value)));
        match (self.op, sets.as_slice()) {
            (SetOp::Intersection, [a, b]) => {
                self.to_bag(a.iter().filter(|value| b.contains(*value)).cloned().collect())
            }
            (SetOp::AtLeastOneMemberOf, [a, b]) => boolean(a.iter().any(|value| b.contains(value))),
            (SetOp::Subset, [a, b]) => boolean(is_subset(a, b)),
            (SetOp::SetEquals, [a, b]) => boolean(is_subset(a, b) && is_subset(b, a)),
            _ => Err(processing_error(
                short_id,
                format!("Expected 2 arguments, got {}", arguments.len()),
            )),
        }
    }
}

impl<T: DataType> FunctionDefinition for FunctionDefinitionSet<T> {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn data_type_id(&self) -> Identifier {
        if self.op.returns_bag() {
            T::id()
        } else {
            DataTypeBoolean::id()
        }
    }

    fn returns_bag(&self) -> bool {
        self.op.returns_bag()
    }

    fn evaluate(&self, _context: &dyn EvaluationContext, arguments: &[&dyn FunctionArgument]) -> ExpressionResult {
        match self.evaluate_op(arguments) {
            Ok(result) | Err(result) => result,
        }
    }
}

fn register_type<T: DataType>(registry: &mut FunctionRegistry) {
    for op in [
        SetOp::Intersection,
        SetOp::Union,
        SetOp::AtLeastOneMemberOf,
        SetOp::Subset,
        SetOp::SetEquals,
    ] {
        registry.register(Arc::new(FunctionDefinitionSet::<T>::new(op)));
    }
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    register_type::<DataTypeString>(registry);
    register_type::<DataTypeInteger>(registry);
    register_type::<DataTypeDouble>(registry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_keeps_first_occurrence_order() {
        assert_eq!(distinct(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn test_subset() {
        assert!(is_subset(&[1, 2], &[2, 1, 3]));
        assert!(!is_subset(&[1, 4], &[2, 1, 3]));
        assert!(is_subset::<i64>(&[], &[1]));
    }
}
