use super::{Accumulator, Combinable, CombiningAlgorithm, CombiningElement};
use crate::eval::{Decision, EvaluationContext, EvaluationResult};
use crate::identifier::Identifier;
use crate::policy::{CombinerParameter, PolicyDefaults};

/// The first child that is not NotApplicable decides
#[derive(Debug, Clone)]
pub struct FirstApplicable {
    id: Identifier,
}

impl FirstApplicable {
    pub fn new(id: Identifier) -> Self {
        Self { id }
    }
}

impl<T: Combinable> CombiningAlgorithm<T> for FirstApplicable {
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
        let mut accumulator = Accumulator::default();
        for element in elements {
            let decision = accumulator.absorb(element.element.evaluate(context, defaults));
            if decision != Decision::NotApplicable {
                return accumulator.finish(decision);
            }
        }
        accumulator.finish(Decision::NotApplicable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combining::testing::{combine, obligation_ids, Fixed};
    use crate::identifier::RULE_FIRST_APPLICABLE;

    #[test]
    fn test_first_applicable() {
        let algorithm = FirstApplicable::new(RULE_FIRST_APPLICABLE);

        let result = combine(
            &algorithm,
            &[
                Fixed::new(Decision::NotApplicable),
                Fixed::new(Decision::Permit).with_obligation("first"),
                Fixed::new(Decision::Deny),
            ],
        );
        assert_eq!(result.decision, Decision::Permit);
        assert_eq!(obligation_ids(&result), vec!["first"]);

        let result = combine(&algorithm, &[Fixed::new(Decision::IndeterminateDeny), Fixed::new(Decision::Permit)]);
        assert_eq!(result.decision, Decision::IndeterminateDeny);

        let result = combine(&algorithm, &[Fixed::new(Decision::NotApplicable)]);
        assert_eq!(result.decision, Decision::NotApplicable);
    }
}
