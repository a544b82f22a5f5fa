//! Ordering comparisons

use std::cmp::Ordering;
use std::sync::Arc;

use super::{arity_violation, Arity, FunctionDefinitionHomogeneous, FunctionRegistry};
use crate::datatypes::{
    DataType, DataTypeBoolean, DataTypeDate, DataTypeDateTime, DataTypeDouble, DataTypeInteger, DataTypeString,
    DataTypeTime,
};
use crate::identifier::Identifier;

fn compare<T: DataType>(args: &[T::Native]) -> Result<Option<Ordering>, String>
where
    T::Native: PartialOrd,
{
    match args {
        [a, b] => Ok(a.partial_cmp(b)),
        _ => Err(arity_violation(args.len())),
    }
}

fn greater_than<T: DataType>(args: &[T::Native]) -> Result<bool, String>
where
    T::Native: PartialOrd,
{
    compare::<T>(args).map(|ordering| ordering == Some(Ordering::Greater))
}

fn greater_than_or_equal<T: DataType>(args: &[T::Native]) -> Result<bool, String>
where
    T::Native: PartialOrd,
{
    compare::<T>(args).map(|ordering| matches!(ordering, Some(Ordering::Greater | Ordering::Equal)))
}

fn less_than<T: DataType>(args: &[T::Native]) -> Result<bool, String>
where
    T::Native: PartialOrd,
{
    compare::<T>(args).map(|ordering| ordering == Some(Ordering::Less))
}

fn less_than_or_equal<T: DataType>(args: &[T::Native]) -> Result<bool, String>
where
    T::Native: PartialOrd,
{
    compare::<T>(args).map(|ordering| matches!(ordering, Some(Ordering::Less | Ordering::Equal)))
}

fn register_type<T: DataType>(registry: &mut FunctionRegistry)
where
    T::Native: PartialOrd,
{
    let functions: [(&str, fn(&[T::Native]) -> Result<bool, String>); 4] = [
        ("greater-than", greater_than::<T>),
        ("greater-than-or-equal", greater_than_or_equal::<T>),
        ("less-than", less_than::<T>),
        ("less-than-or-equal", less_than_or_equal::<T>),
    ];
    for (suffix, compute) in functions {
        registry.register(Arc::new(FunctionDefinitionHomogeneous::<T, DataTypeBoolean>::new(
            Identifier::function_v1(&format!("{}-{}", T::short_name(), suffix)),
            Arity::Exact(2),
            compute,
        )));
    }
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    register_type::<DataTypeInteger>(registry);
    register_type::<DataTypeDouble>(registry);
    register_type::<DataTypeString>(registry);
    register_type::<DataTypeDate>(registry);
    register_type::<DataTypeDateTime>(registry);
    register_type::<DataTypeTime>(registry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_comparisons() {
        assert_eq!(greater_than::<DataTypeInteger>(&[3, 2]), Ok(true));
        assert_eq!(greater_than_or_equal::<DataTypeInteger>(&[2, 2]), Ok(true));
        assert_eq!(less_than::<DataTypeInteger>(&[2, 2]), Ok(false));
        assert_eq!(less_than_or_equal::<DataTypeInteger>(&[1, 2]), Ok(true));
    }

    #[test]
    fn test_nan_never_compares() {
        assert_eq!(greater_than::<DataTypeDouble>(&[f64::NAN, 1.0]), Ok(false));
        assert_eq!(less_than_or_equal::<DataTypeDouble>(&[f64::NAN, 1.0]), Ok(false));
    }
}
