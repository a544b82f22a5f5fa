use super::{Accumulator, Combinable, CombiningAlgorithm, CombiningElement};
use crate::eval::{Decision, EvaluationContext, EvaluationResult};
use crate::identifier::Identifier;
use crate::policy::{CombinerParameter, Effect, PolicyDefaults};

/// `winner` if any child decides it, otherwise the opposite effect. Never
/// NotApplicable or Indeterminate.
fn combine_unless<T: Combinable>(
    winner: Effect,
    context: &dyn EvaluationContext,
    elements: &[CombiningElement<'_, T>],
    defaults: Option<&PolicyDefaults>,
) -> EvaluationResult {
    let winning = Decision::from(winner);
    let mut accumulator = Accumulator::default();

    for element in elements {
        if accumulator.absorb(element.element.evaluate(context, defaults)) == winning {
            return accumulator.finish(winning);
        }
    }

    let fallback = match winner {
        Effect::Permit => Decision::Deny,
        Effect::Deny => Decision::Permit,
    };
    accumulator.finish(fallback)
}

#[derive(Debug, Clone)]
pub struct DenyUnlessPermit {
    id: Identifier,
}

impl DenyUnlessPermit {
    pub fn new(id: Identifier) -> Self {
        Self { id }
    }
}

impl<T: Combinable> CombiningAlgorithm<T> for DenyUnlessPermit {
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
        combine_unless(Effect::Permit, context, elements, defaults)
    }
}

#[derive(Debug, Clone)]
pub struct PermitUnlessDeny {
    id: Identifier,
}

impl PermitUnlessDeny {
    pub fn new(id: Identifier) -> Self {
        Self { id }
    }
}

impl<T: Combinable> CombiningAlgorithm<T> for PermitUnlessDeny {
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
        combine_unless(Effect::Deny, context, elements, defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combining::testing::{combine, obligation_ids, Fixed};
    use crate::identifier::{RULE_DENY_UNLESS_PERMIT, RULE_PERMIT_UNLESS_DENY};

    #[test]
    fn test_deny_unless_permit() {
        let algorithm = DenyUnlessPermit::new(RULE_DENY_UNLESS_PERMIT);

        let result = combine(&algorithm, &[Fixed::new(Decision::IndeterminatePermit), Fixed::new(Decision::NotApplicable)]);
        assert_eq!(result.decision, Decision::Deny);
        assert!(result.status.is_ok());

        let result = combine(&algorithm, &[Fixed::new(Decision::Deny), Fixed::new(Decision::Permit)]);
        assert_eq!(result.decision, Decision::Permit);
    }

    #[test]
    fn test_permit_unless_deny_keeps_permit_obligations() {
        let algorithm = PermitUnlessDeny::new(RULE_PERMIT_UNLESS_DENY);
        let result = combine(
            &algorithm,
            &[
                Fixed::new(Decision::Permit).with_obligation("audit"),
                Fixed::new(Decision::NotApplicable),
            ],
        );
        assert_eq!(result.decision, Decision::Permit);
        assert_eq!(obligation_ids(&result), vec!["audit"]);
    }
}
