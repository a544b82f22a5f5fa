use super::{Accumulator, Combinable, CombiningAlgorithm, CombiningElement};
use crate::eval::{Decision, EvaluationContext, EvaluationResult};
use crate::identifier::Identifier;
use crate::policy::{CombinerParameter, MatchResult, PolicyDefaults};
use crate::status::Status;

/// Exactly one child may match its target; that child decides.
///
/// Only defined for policies. Two matching children, or a target that cannot
/// be evaluated, give Indeterminate.
#[derive(Debug, Clone)]
pub struct OnlyOneApplicable {
    id: Identifier,
}

impl OnlyOneApplicable {
    pub fn new(id: Identifier) -> Self {
        Self { id }
    }
}

impl<T: Combinable> CombiningAlgorithm<T> for OnlyOneApplicable {
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
        let mut selected: Option<&CombiningElement<'_, T>> = None;

        for element in elements {
            match element.element.match_target(context, defaults) {
                MatchResult::Indeterminate(status) => {
                    return EvaluationResult::indeterminate(Decision::IndeterminateDenyPermit, status);
                }
                MatchResult::Match if selected.is_some() => {
                    return EvaluationResult::indeterminate(
                        Decision::IndeterminateDenyPermit,
                        Status::processing_error("More than one applicable policy"),
                    );
                }
                MatchResult::Match => selected = Some(element),
                MatchResult::NoMatch => {}
            }
        }

        match selected {
            Some(element) => {
                let mut accumulator = Accumulator::default();
                let decision = accumulator.absorb(element.element.evaluate(context, defaults));
                accumulator.finish(decision)
            }
            None => EvaluationResult::not_applicable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combining::testing::{combine, Fixed};
    use crate::identifier::POLICY_ONLY_ONE_APPLICABLE;

    #[test]
    fn test_single_match_decides() {
        let algorithm = OnlyOneApplicable::new(POLICY_ONLY_ONE_APPLICABLE);
        let result = combine(
            &algorithm,
            &[
                Fixed::new(Decision::Permit).with_target(MatchResult::NoMatch),
                Fixed::new(Decision::Deny),
            ],
        );
        assert_eq!(result.decision, Decision::Deny);
    }

    #[test]
    fn test_more_than_one_match() {
        let algorithm = OnlyOneApplicable::new(POLICY_ONLY_ONE_APPLICABLE);
        let result = combine(&algorithm, &[Fixed::new(Decision::Permit), Fixed::new(Decision::Permit)]);
        assert_eq!(result.decision, Decision::IndeterminateDenyPermit);
        assert_eq!(result.status.message(), Some("More than one applicable policy"));
    }

    #[test]
    fn test_no_match() {
        let algorithm = OnlyOneApplicable::new(POLICY_ONLY_ONE_APPLICABLE);
        let result = combine(&algorithm, &[Fixed::new(Decision::Permit).with_target(MatchResult::NoMatch)]);
        assert_eq!(result.decision, Decision::NotApplicable);
    }
}
