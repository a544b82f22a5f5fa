use tracing::debug;

use super::{Accumulator, Combinable, CombiningAlgorithm, CombiningElement};
use crate::eval::{Decision, EvaluationContext, EvaluationResult};
use crate::identifier::Identifier;
use crate::policy::{CombinerParameter, Effect, PolicyDefaults};

/// Shared body of deny-overrides and permit-overrides; `winner` is the effect
/// that short-circuits.
fn combine_overrides<T: Combinable>(
    winner: Effect,
    context: &dyn EvaluationContext,
    elements: &[CombiningElement<'_, T>],
    defaults: Option<&PolicyDefaults>,
) -> EvaluationResult {
    let winning = Decision::from(winner);
    let losing_effect = match winner {
        Effect::Deny => Effect::Permit,
        Effect::Permit => Effect::Deny,
    };
    let winning_error = Decision::indeterminate_for(winner);
    let losing_error = Decision::indeterminate_for(losing_effect);

    let mut accumulator = Accumulator::default();
    let mut error_winner = false;
    let mut error_loser = false;
    let mut error_both = false;
    let mut losing = false;

    for element in elements {
        let decision = accumulator.absorb(element.element.evaluate(context, defaults));
        match decision {
            d if d == winning => {
                debug!("{} overrides remaining children", winning);
                return accumulator.finish(winning);
            }
            Decision::NotApplicable => {}
            d if d == losing_error => error_loser = true,
            d if d == winning_error => error_winner = true,
            Decision::Indeterminate | Decision::IndeterminateDenyPermit => error_both = true,
            _ => losing = true,
        }
    }

    let decision = if error_both || (error_winner && (error_loser || losing)) {
        Decision::IndeterminateDenyPermit
    } else if error_winner {
        winning_error
    } else if losing {
        Decision::from(losing_effect)
    } else if error_loser {
        losing_error
    } else {
        Decision::NotApplicable
    };
    accumulator.finish(decision)
}

/// Any Deny wins; also registered under the ordered variant's id
#[derive(Debug, Clone)]
pub struct DenyOverrides {
    id: Identifier,
}

impl DenyOverrides {
    pub fn new(id: Identifier) -> Self {
        Self { id }
    }
}

impl<T: Combinable> CombiningAlgorithm<T> for DenyOverrides {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
        defaults: Option<&PolicyDefaults>,
    ) -> EvaluationResult {
        combine_overrides(Effect::Deny, context, elements, defaults)
    }
}

/// Any Permit wins; also registered under the ordered variant's id
#[derive(Debug, Clone)]
pub struct PermitOverrides {
    id: Identifier,
}

impl PermitOverrides {
    pub fn new(id: Identifier) -> Self {
        Self { id }
    }
}

impl<T: Combinable> CombiningAlgorithm<T> for PermitOverrides {
    fn id(&self) -> &Identifier {
        &self.id
    }

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        _parameters: &[CombinerParameter],
        defaults: Option<&PolicyDefaults>,
    ) -> EvaluationResult {
        combine_overrides(Effect::Permit, context, elements, defaults)
    }
}
