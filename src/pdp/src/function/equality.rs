//! `*-equal` functions

use std::sync::Arc;

use super::{arity_violation, Arity, FunctionDefinition, FunctionDefinitionHomogeneous, FunctionRegistry};
use crate::datatypes::{
    DataType, DataTypeAnyUri, DataTypeBoolean, DataTypeDate, DataTypeDateTime, DataTypeDayTimeDuration,
    DataTypeDouble, DataTypeInteger, DataTypeString, DataTypeTime, DataTypeYearMonthDuration, Iso8601Duration,
};
use crate::identifier::Identifier;

fn equal<T: DataType>(args: &[T::Native]) -> Result<bool, String> {
    match args {
        [a, b] => Ok(a == b),
        _ => Err(arity_violation(args.len())),
    }
}

fn equal_ignore_case(args: &[String]) -> Result<bool, String> {
    match args {
        [a, b] => Ok(a.to_lowercase() == b.to_lowercase()),
        _ => Err(arity_violation(args.len())),
    }
}

/// Durations compare by value, so `PT1H` equals `PT60M`
fn duration_equal(args: &[Iso8601Duration]) -> Result<bool, String> {
    let normalized = |d: &Iso8601Duration| {
        let sign = if d.negative && !d.is_zero() { -1 } else { 1 };
        (
            sign * i64::from(d.total_months().unwrap_or(u32::MAX)),
            d.day_time_delta().map(|delta| delta * sign as i32),
        )
    };
    match args {
        [a, b] => Ok(normalized(a) == normalized(b)),
        _ => Err(arity_violation(args.len())),
    }
}

fn equality<T: DataType>(id: Identifier) -> Arc<dyn FunctionDefinition> {
    Arc::new(FunctionDefinitionHomogeneous::<T, DataTypeBoolean>::new(
        id,
        Arity::Exact(2),
        equal::<T>,
    ))
}

fn v1<T: DataType>() -> Arc<dyn FunctionDefinition> {
    equality::<T>(Identifier::function_v1(&format!("{}-equal", T::short_name())))
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    registry.register(v1::<DataTypeString>());
    registry.register(v1::<DataTypeBoolean>());
    registry.register(v1::<DataTypeInteger>());
    registry.register(v1::<DataTypeDouble>());
    registry.register(v1::<DataTypeDate>());
    registry.register(v1::<DataTypeDateTime>());
    registry.register(v1::<DataTypeTime>());
    registry.register(v1::<DataTypeAnyUri>());

    registry.register(Arc::new(
        FunctionDefinitionHomogeneous::<DataTypeDayTimeDuration, DataTypeBoolean>::new(
            Identifier::function_v3("dayTimeDuration-equal"),
            Arity::Exact(2),
            duration_equal,
        ),
    ));
    registry.register(Arc::new(
        FunctionDefinitionHomogeneous::<DataTypeYearMonthDuration, DataTypeBoolean>::new(
            Identifier::function_v3("yearMonthDuration-equal"),
            Arity::Exact(2),
            duration_equal,
        ),
    ));
    registry.register(Arc::new(FunctionDefinitionHomogeneous::<DataTypeString, DataTypeBoolean>::new(
        Identifier::function_v3("string-equal-ignore-case"),
        Arity::Exact(2),
        equal_ignore_case,
    )));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_equal_by_value() {
        let hour: Iso8601Duration = "PT1H".parse().unwrap();
        let minutes: Iso8601Duration = "PT60M".parse().unwrap();
        assert_eq!(duration_equal(&[hour, minutes]), Ok(true));

        let negative: Iso8601Duration = "-PT1H".parse().unwrap();
        assert_eq!(duration_equal(&[hour, negative]), Ok(false));
    }

    #[test]
    fn test_equal_ignore_case() {
        assert_eq!(equal_ignore_case(&["Alice".into(), "ALICE".into()]), Ok(true));
    }
}
