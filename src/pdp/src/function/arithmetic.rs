//! Integer and double arithmetic

use std::sync::Arc;

use super::{arity_violation, Arity, Compute, FunctionDefinitionHomogeneous, FunctionRegistry};
use crate::datatypes::{DataTypeDouble, DataTypeInteger};
use crate::identifier::Identifier;

const OVERFLOW: &str = "Integer overflow";
const DIVIDE_BY_ZERO: &str = "Divide by zero";

fn integer_add(args: &[i64]) -> Result<i64, String> {
    args.iter()
        .try_fold(0i64, |sum, value| sum.checked_add(*value))
        .ok_or_else(|| OVERFLOW.to_string())
}

fn integer_multiply(args: &[i64]) -> Result<i64, String> {
    args.iter()
        .try_fold(1i64, |product, value| product.checked_mul(*value))
        .ok_or_else(|| OVERFLOW.to_string())
}

fn integer_subtract(args: &[i64]) -> Result<i64, String> {
    match args {
        [a, b] => a.checked_sub(*b).ok_or_else(|| OVERFLOW.to_string()),
        _ => Err(arity_violation(args.len())),
    }
}

fn integer_divide(args: &[i64]) -> Result<i64, String> {
    match args {
        [_, 0] => Err(DIVIDE_BY_ZERO.to_string()),
        [a, b] => a.checked_div(*b).ok_or_else(|| OVERFLOW.to_string()),
        _ => Err(arity_violation(args.len())),
    }
}

fn integer_mod(args: &[i64]) -> Result<i64, String> {
    match args {
        [_, 0] => Err(DIVIDE_BY_ZERO.to_string()),
        [a, b] => a.checked_rem(*b).ok_or_else(|| OVERFLOW.to_string()),
        _ => Err(arity_violation(args.len())),
    }
}

fn integer_abs(args: &[i64]) -> Result<i64, String> {
    match args {
        [a] => a.checked_abs().ok_or_else(|| OVERFLOW.to_string()),
        _ => Err(arity_violation(args.len())),
    }
}

fn double_add(args: &[f64]) -> Result<f64, String> {
    Ok(args.iter().sum())
}

fn double_multiply(args: &[f64]) -> Result<f64, String> {
    Ok(args.iter().product())
}

fn double_subtract(args: &[f64]) -> Result<f64, String> {
    match args {
        [a, b] => Ok(a - b),
        _ => Err(arity_violation(args.len())),
    }
}

fn double_divide(args: &[f64]) -> Result<f64, String> {
    match args {
        [_, b] if *b == 0.0 => Err(DIVIDE_BY_ZERO.to_string()),
        [a, b] => Ok(a / b),
        _ => Err(arity_violation(args.len())),
    }
}

fn double_unary(args: &[f64], op: fn(f64) -> f64) -> Result<f64, String> {
    match args {
        [a] => Ok(op(*a)),
        _ => Err(arity_violation(args.len())),
    }
}

fn double_abs(args: &[f64]) -> Result<f64, String> {
    double_unary(args, f64::abs)
}

fn double_round(args: &[f64]) -> Result<f64, String> {
    double_unary(args, f64::round)
}

fn double_floor(args: &[f64]) -> Result<f64, String> {
    double_unary(args, f64::floor)
}

fn integer(registry: &mut FunctionRegistry, name: &str, arity: Arity, compute: Compute<DataTypeInteger, DataTypeInteger>) {
    registry.register(Arc::new(FunctionDefinitionHomogeneous::<DataTypeInteger, DataTypeInteger>::new(
        Identifier::function_v1(name),
        arity,
        compute,
    )));
}

fn double(registry: &mut FunctionRegistry, name: &str, arity: Arity, compute: Compute<DataTypeDouble, DataTypeDouble>) {
    registry.register(Arc::new(FunctionDefinitionHomogeneous::<DataTypeDouble, DataTypeDouble>::new(
        Identifier::function_v1(name),
        arity,
        compute,
    )));
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    integer(registry, "integer-add", Arity::AtLeast(2), integer_add);
    integer(registry, "integer-subtract", Arity::Exact(2), integer_subtract);
    integer(registry, "integer-multiply", Arity::AtLeast(2), integer_multiply);
    integer(registry, "integer-divide", Arity::Exact(2), integer_divide);
    integer(registry, "integer-mod", Arity::Exact(2), integer_mod);
    integer(registry, "integer-abs", Arity::Exact(1), integer_abs);

    double(registry, "double-add", Arity::AtLeast(2), double_add);
    double(registry, "double-subtract", Arity::Exact(2), double_subtract);
    double(registry, "double-multiply", Arity::AtLeast(2), double_multiply);
    double(registry, "double-divide", Arity::Exact(2), double_divide);
    double(registry, "double-abs", Arity::Exact(1), double_abs);
    double(registry, "round", Arity::Exact(1), double_round);
    double(registry, "floor", Arity::Exact(1), double_floor);
}
