//! Function arguments: computed values and lazily evaluated expressions

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;

use crate::bag::Bag;
use crate::datatypes::AttributeValue;
use crate::eval::EvaluationContext;
use crate::expression::{Expression, ExpressionResult};
use crate::policy::PolicyDefaults;
use crate::status::{Status, StatusCode, STATUS_OK};

static ARGUMENT_OK: Status = STATUS_OK;

/// Status reported by an argument whose expression never produced a result
pub static STATUS_NULL_EXPRESSION_RESULT: Lazy<Status> =
    Lazy::new(|| Status::new(StatusCode::ProcessingError, "Null expression result"));

/// A value usable as a function argument
pub trait FunctionArgument {
    /// `None` means no status was recorded
    fn status(&self) -> Option<&Status>;

    /// An absent status counts as OK
    fn is_ok(&self) -> bool {
        self.status().map_or(true, Status::is_ok)
    }

    fn is_bag(&self) -> bool;

    fn value(&self) -> Option<&AttributeValue>;

    fn bag(&self) -> Option<&Bag>;
}

/// An already computed single value
#[derive(Debug, Clone)]
pub struct FunctionArgumentAttributeValue {
    value: AttributeValue,
}

impl FunctionArgumentAttributeValue {
    pub fn new(value: AttributeValue) -> Self {
        Self { value }
    }
}

impl FunctionArgument for FunctionArgumentAttributeValue {
    fn status(&self) -> Option<&Status> {
        Some(&ARGUMENT_OK)
    }

    fn is_bag(&self) -> bool {
        false
    }

    fn value(&self) -> Option<&AttributeValue> {
        Some(&self.value)
    }

    fn bag(&self) -> Option<&Bag> {
        None
    }
}

/// An already computed bag
#[derive(Debug, Clone)]
pub struct FunctionArgumentBag {
    bag: Bag,
}

impl FunctionArgumentBag {
    pub fn new(bag: Bag) -> Self {
        Self { bag }
    }
}

impl FunctionArgument for FunctionArgumentBag {
    fn status(&self) -> Option<&Status> {
        Some(&ARGUMENT_OK)
    }

    fn is_bag(&self) -> bool {
        true
    }

    fn value(&self) -> Option<&AttributeValue> {
        None
    }

    fn bag(&self) -> Option<&Bag> {
        Some(&self.bag)
    }
}

/// An expression bound to its context, evaluated on first access.
///
/// Every accessor goes through one memoized evaluation, so the expression
/// runs at most once however many accessors are called. Evaluation errors
/// become a processing-error result here and never propagate further.
///
/// Request scoped: the cell is not thread safe.
#[derive(Default)]
pub struct FunctionArgumentExpression<'a> {
    expression: Option<&'a Expression>,
    context: Option<&'a dyn EvaluationContext>,
    defaults: Option<&'a PolicyDefaults>,
    result: OnceCell<Option<ExpressionResult>>,
}

impl<'a> FunctionArgumentExpression<'a> {
    pub fn new(
        expression: &'a Expression,
        context: &'a dyn EvaluationContext,
        defaults: Option<&'a PolicyDefaults>,
    ) -> Self {
        Self {
            expression: Some(expression),
            context: Some(context),
            defaults,
            result: OnceCell::new(),
        }
    }

    /// Whether the expression has been evaluated yet
    pub fn is_evaluated(&self) -> bool {
        self.result.get().is_some()
    }

    fn evaluate_expression(&self) -> Option<&ExpressionResult> {
        self.result
            .get_or_init(|| {
                let expression = self.expression?;
                let context = self.context?;
                Some(match expression.evaluate(context, self.defaults) {
                    Ok(result) => result,
                    Err(e) => ExpressionResult::error(Status::processing_error(e.to_string())),
                })
            })
            .as_ref()
    }
}

impl FunctionArgument for FunctionArgumentExpression<'_> {
    fn status(&self) -> Option<&Status> {
        match self.evaluate_expression() {
            Some(result) => Some(result.status()),
            None => Some(&*STATUS_NULL_EXPRESSION_RESULT),
        }
    }

    fn is_bag(&self) -> bool {
        self.evaluate_expression().map_or(false, ExpressionResult::is_bag)
    }

    fn value(&self) -> Option<&AttributeValue> {
        self.evaluate_expression().and_then(ExpressionResult::value)
    }

    fn bag(&self) -> Option<&Bag> {
        self.evaluate_expression().and_then(ExpressionResult::bag_value)
    }
}

impl std::fmt::Debug for FunctionArgumentExpression<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionArgumentExpression")
            .field("expression", &self.expression)
            .field("evaluated", &self.is_evaluated())
            .finish()
    }
}
