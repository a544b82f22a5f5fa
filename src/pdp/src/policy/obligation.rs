//! Obligations and advice

use serde::{Deserialize, Serialize};

use super::{Effect, PolicyDefaults};
use crate::datatypes::AttributeValue;
use crate::eval::EvaluationContext;
use crate::expression::{Expression, ExpressionValue};
use crate::identifier::Identifier;
use crate::status::Status;

/// An evaluated attribute assignment carried by an obligation or advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeAssignment {
    pub attribute_id: Identifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Identifier>,
    pub value: AttributeValue,
}

/// Expression producing attribute assignments; a bag yields one assignment
/// per value
#[derive(Debug, Clone)]
pub struct AttributeAssignmentExpression {
    pub attribute_id: Identifier,
    pub category: Option<Identifier>,
    pub issuer: Option<Identifier>,
    pub expression: Expression,
}

impl AttributeAssignmentExpression {
    pub fn new(attribute_id: impl Into<Identifier>, expression: impl Into<Expression>) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            category: None,
            issuer: None,
            expression: expression.into(),
        }
    }

    pub fn with_category(mut self, category: Identifier) -> Self {
        self.category = Some(category);
        self
    }

    fn assignment(&self, value: AttributeValue) -> AttributeAssignment {
        AttributeAssignment {
            attribute_id: self.attribute_id.clone(),
            category: self.category.clone(),
            issuer: self.issuer.clone(),
            value,
        }
    }

    pub fn evaluate(
        &self,
        context: &dyn EvaluationContext,
        defaults: Option<&PolicyDefaults>,
    ) -> Result<Vec<AttributeAssignment>, Status> {
        let result = self
            .expression
            .evaluate(context, defaults)
            .map_err(|e| Status::processing_error(e.to_string()))?;
        if !result.is_ok() {
            return Err(result.status().clone());
        }
        match result.into_payload() {
            Some(ExpressionValue::Single(value)) => Ok(vec![self.assignment(value)]),
            Some(ExpressionValue::Bag(bag)) => Ok(bag.into_iter().map(|value| self.assignment(value)).collect()),
            None => Ok(Vec::new()),
        }
    }
}

fn evaluate_assignments(
    assignments: &[AttributeAssignmentExpression],
    context: &dyn EvaluationContext,
    defaults: Option<&PolicyDefaults>,
) -> Result<Vec<AttributeAssignment>, Status> {
    let mut evaluated = Vec::new();
    for assignment in assignments {
        evaluated.extend(assignment.evaluate(context, defaults)?);
    }
    Ok(evaluated)
}

/// A directive the caller must act on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: Identifier,
    #[serde(default)]
    pub attribute_assignments: Vec<AttributeAssignment>,
}

/// A directive the caller may act on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub id: Identifier,
    #[serde(default)]
    pub attribute_assignments: Vec<AttributeAssignment>,
}

#[derive(Debug, Clone)]
pub struct ObligationExpression {
    pub id: Identifier,
    pub fulfill_on: Effect,
    pub assignments: Vec<AttributeAssignmentExpression>,
}

impl ObligationExpression {
    pub fn new(id: impl Into<Identifier>, fulfill_on: Effect) -> Self {
        Self {
            id: id.into(),
            fulfill_on,
            assignments: Vec::new(),
        }
    }

    pub fn with_assignment(mut self, assignment: AttributeAssignmentExpression) -> Self {
        self.assignments.push(assignment);
        self
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> Result<Obligation, Status> {
        Ok(Obligation {
            id: self.id.clone(),
            attribute_assignments: evaluate_assignments(&self.assignments, context, defaults)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AdviceExpression {
    pub id: Identifier,
    pub applies_to: Effect,
    pub assignments: Vec<AttributeAssignmentExpression>,
}

impl AdviceExpression {
    pub fn new(id: impl Into<Identifier>, applies_to: Effect) -> Self {
        Self {
            id: id.into(),
            applies_to,
            assignments: Vec::new(),
        }
    }

    pub fn with_assignment(mut self, assignment: AttributeAssignmentExpression) -> Self {
        self.assignments.push(assignment);
        self
    }

    pub fn evaluate(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> Result<Advice, Status> {
        Ok(Advice {
            id: self.id.clone(),
            attribute_assignments: evaluate_assignments(&self.assignments, context, defaults)?,
        })
    }
}

/// Evaluate the obligations and advice that apply to `effect`
pub(crate) fn evaluate_for_effect(
    effect: Effect,
    obligations: &[ObligationExpression],
    advice: &[AdviceExpression],
    context: &dyn EvaluationContext,
    defaults: Option<&PolicyDefaults>,
) -> Result<(Vec<Obligation>, Vec<Advice>), Status> {
    let obligations = obligations
        .iter()
        .filter(|obligation| obligation.fulfill_on == effect)
        .map(|obligation| obligation.evaluate(context, defaults))
        .collect::<Result<Vec<_>, _>>()?;
    let advice = advice
        .iter()
        .filter(|advice| advice.applies_to == effect)
        .map(|advice| advice.evaluate(context, defaults))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((obligations, advice))
}
