//! Function library
//!
//! Every function definition declares its identifier, result data type and
//! whether it returns a bag, and evaluates against lazily bound
//! [`FunctionArgument`]s. Arguments are validated and converted through
//! [`ConvertedArgument`], and any failure comes back as an error
//! [`ExpressionResult`] whose message is prefixed with the short function id.
//!
//! # Families
//!
//! - equality, arithmetic, comparison, string (homogeneous argument types)
//! - logical (`and`, `or`, `not`, `n-of`), short-circuiting
//! - bag and set functions
//! - date/time arithmetic with ISO-8601 durations
//!
//! # Example
//!
//! ```rust,ignore
//! let registry = FunctionRegistry::standard();
//! let string_equal = registry.get(&FUNCTION_STRING_EQUAL).unwrap();
//! let result = string_equal.evaluate(&context, &[&a, &b]);
//! ```

pub mod argument;
pub mod arithmetic;
pub mod bag;
pub mod comparison;
pub mod converted;
pub mod datetime;
pub mod equality;
pub mod logical;
pub mod registry;
pub mod set;
pub mod string;

use std::fmt;
use std::marker::PhantomData;

use crate::datatypes::DataType;
use crate::eval::EvaluationContext;
use crate::expression::ExpressionResult;
use crate::identifier::Identifier;
use crate::status::Status;

pub use argument::{
    FunctionArgument, FunctionArgumentAttributeValue, FunctionArgumentBag, FunctionArgumentExpression,
    STATUS_NULL_EXPRESSION_RESULT,
};
pub use converted::{short_data_type_id, Converted, ConvertedArgument};
pub use registry::FunctionRegistry;

/// A function callable from an `Apply` expression
pub trait FunctionDefinition: Send + Sync {
    fn id(&self) -> &Identifier;

    /// Data type of the result
    fn data_type_id(&self) -> Identifier;

    fn returns_bag(&self) -> bool;

    fn evaluate(&self, context: &dyn EvaluationContext, arguments: &[&dyn FunctionArgument]) -> ExpressionResult;

    /// Id without its URN namespace, for error messages
    fn short_id(&self) -> &str {
        short_function_id(self.id())
    }
}

/// The part of a function id after `function:`
pub fn short_function_id(id: &Identifier) -> &str {
    let id = id.as_str();
    match id.rfind("function:") {
        Some(index) => &id[index + "function:".len()..],
        None => id,
    }
}

/// Error result for `status`, message prefixed with the function's short id
pub(crate) fn function_error(short_id: &str, status: &Status) -> ExpressionResult {
    ExpressionResult::error(status.with_prefix(short_id))
}

pub(crate) fn processing_error(short_id: &str, message: impl fmt::Display) -> ExpressionResult {
    ExpressionResult::error(Status::processing_error(format!("{} {}", short_id, message)))
}

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == *n,
            Arity::AtLeast(n) => count >= *n,
        }
    }

    /// Arity check with the standard message on failure
    pub(crate) fn check(&self, short_id: &str, count: usize) -> Result<(), ExpressionResult> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(processing_error(short_id, format!("Expected {} arguments, got {}", self, count)))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// Pure computation over converted native arguments
pub type Compute<I, O> = fn(&[<I as DataType>::Native]) -> Result<<O as DataType>::Native, String>;

/// A function whose scalar arguments all share data type `I` and whose
/// result is a single `O`.
///
/// Covers the equality, arithmetic, comparison and most string functions;
/// each instance only differs in id, arity and computation.
pub struct FunctionDefinitionHomogeneous<I: DataType, O: DataType> {
    id: Identifier,
    arity: Arity,
    compute: Compute<I, O>,
    _types: PhantomData<fn() -> (I, O)>,
}

impl<I: DataType, O: DataType> FunctionDefinitionHomogeneous<I, O> {
    pub fn new(id: Identifier, arity: Arity, compute: Compute<I, O>) -> Self {
        Self {
            id,
            arity,
            compute,
            _types: PhantomData,
        }
    }
}

impl<I: DataType, O: DataType> FunctionDefinition for FunctionDefinitionHomogeneous<I, O> {
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
        if let Err(result) = self.arity.check(short_id, arguments.len()) {
            return result;
        }

        let mut natives = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match ConvertedArgument::<I>::new(Some(*argument), false).into_value() {
                Ok(value) => natives.push(value),
                Err(status) => return function_error(short_id, &status),
            }
        }

        match (self.compute)(&natives) {
            Ok(output) => match O::create_attribute_value(output) {
                Ok(value) => ExpressionResult::single(value),
                Err(e) => processing_error(short_id, e.status_message()),
            },
            Err(message) => processing_error(short_id, message),
        }
    }
}

/// Argument count mismatch inside a computation. Unreachable after the arity
/// check, kept so computations never index out of bounds.
pub(crate) fn arity_violation(count: usize) -> String {
    format!("Unexpected argument count {}", count)
}
