//! Combining algorithms
//!
//! A combining algorithm reduces the decisions of a homogeneous sequence of
//! children (rules under a policy, policies and policy sets under a policy
//! set) to one [`EvaluationResult`]. Algorithms are stateless and generic over
//! the child type through [`Combinable`].
//!
//! # Features
//!
//! - deny-overrides, permit-overrides and their ordered variants
//! - first-applicable, only-one-applicable (policies only)
//! - deny-unless-permit, permit-unless-deny
//! - extended Indeterminate (`{D}`, `{P}`, `{DP}`) throughout
//!
//! Obligations and advice survive only from children whose decision equals
//! the combined decision, in encounter order.

pub mod first_applicable;
pub mod only_one_applicable;
pub mod overrides;
pub mod registry;
pub mod unless;

use std::fmt;

use crate::eval::{Decision, EvaluationContext, EvaluationResult};
use crate::identifier::Identifier;
use crate::policy::{Advice, CombinerParameter, MatchResult, Obligation, PolicyDefaults, PolicyIdentifier};
use crate::status::Status;

pub use first_applicable::FirstApplicable;
pub use only_one_applicable::OnlyOneApplicable;
pub use overrides::{DenyOverrides, PermitOverrides};
pub use registry::CombiningAlgorithmRegistry;
pub use unless::{DenyUnlessPermit, PermitUnlessDeny};

/// A child a combining algorithm can evaluate
pub trait Combinable {
    /// Full evaluation, target included
    fn evaluate(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> EvaluationResult;

    /// Target only
    fn match_target(&self, context: &dyn EvaluationContext, defaults: Option<&PolicyDefaults>) -> MatchResult;
}

/// A child together with the combiner parameters scoped to it
#[derive(Debug)]
pub struct CombiningElement<'a, T> {
    pub element: &'a T,
    pub parameters: &'a [CombinerParameter],
}

impl<'a, T> CombiningElement<'a, T> {
    pub fn new(element: &'a T, parameters: &'a [CombinerParameter]) -> Self {
        Self { element, parameters }
    }
}

impl<'a, T> Clone for CombiningElement<'a, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T> Copy for CombiningElement<'a, T> {}

/// Reduces child decisions to one
pub trait CombiningAlgorithm<T>: Send + Sync + fmt::Debug {
    fn id(&self) -> &Identifier;

    fn combine(
        &self,
        context: &dyn EvaluationContext,
        elements: &[CombiningElement<'_, T>],
        parameters: &[CombinerParameter],
        defaults: Option<&PolicyDefaults>,
    ) -> EvaluationResult;
}

/// Collects what children contribute while an algorithm runs
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    permit_obligations: Vec<Obligation>,
    permit_advice: Vec<Advice>,
    deny_obligations: Vec<Obligation>,
    deny_advice: Vec<Advice>,
    policy_identifiers: Vec<PolicyIdentifier>,
    first_error: Option<Status>,
}

impl Accumulator {
    /// Record a child result and return its decision
    pub(crate) fn absorb(&mut self, result: EvaluationResult) -> Decision {
        let decision = result.decision;
        match decision {
            Decision::Permit => {
                self.permit_obligations.extend(result.obligations);
                self.permit_advice.extend(result.advice);
            }
            Decision::Deny => {
                self.deny_obligations.extend(result.obligations);
                self.deny_advice.extend(result.advice);
            }
            Decision::NotApplicable => {}
            _ => {
                self.first_error.get_or_insert(result.status);
            }
        }
        self.policy_identifiers.extend(result.policy_identifiers);
        decision
    }

    /// Combined result carrying the obligations that match `decision`
    pub(crate) fn finish(self, decision: Decision) -> EvaluationResult {
        let status = if decision.is_indeterminate() {
            self.first_error
                .unwrap_or_else(|| Status::processing_error("Indeterminate combining result"))
        } else {
            Status::ok()
        };
        let (obligations, advice) = match decision {
            Decision::Permit => (self.permit_obligations, self.permit_advice),
            Decision::Deny => (self.deny_obligations, self.deny_advice),
            _ => (Vec::new(), Vec::new()),
        };
        EvaluationResult {
            decision,
            status,
            obligations,
            advice,
            policy_identifiers: self.policy_identifiers,
        }
    }

    /// Finish with an explicit status
    pub(crate) fn finish_with_status(self, decision: Decision, status: Status) -> EvaluationResult {
        EvaluationResult {
            status,
            ..self.finish(decision)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Children with fixed outcomes

    use super::*;

    #[derive(Debug, Clone)]
    pub struct Fixed {
        pub decision: Decision,
        pub obligation: Option<&'static str>,
        pub target: MatchResult,
    }

    impl Fixed {
        pub fn new(decision: Decision) -> Self {
            Self {
                decision,
                obligation: None,
                target: MatchResult::Match,
            }
        }

        pub fn with_obligation(mut self, id: &'static str) -> Self {
            self.obligation = Some(id);
            self
        }

        pub fn with_target(mut self, target: MatchResult) -> Self {
            self.target = target;
            self
        }
    }

    impl Combinable for Fixed {
        fn evaluate(&self, _context: &dyn EvaluationContext, _defaults: Option<&PolicyDefaults>) -> EvaluationResult {
            let mut result = if self.decision.is_indeterminate() {
                EvaluationResult::indeterminate(self.decision, Status::processing_error("fixed failure"))
            } else {
                EvaluationResult::new(self.decision)
            };
            if let (Some(id), Some(_)) = (self.obligation, self.decision.effect()) {
                result.obligations.push(Obligation {
                    id: Identifier::from_static(id),
                    attribute_assignments: Vec::new(),
                });
            }
            result
        }

        fn match_target(&self, _context: &dyn EvaluationContext, _defaults: Option<&PolicyDefaults>) -> MatchResult {
            self.target.clone()
        }
    }

    pub fn combine<A: CombiningAlgorithm<Fixed>>(algorithm: &A, children: &[Fixed]) -> EvaluationResult {
        let request = crate::eval::Request::new();
        let context = crate::eval::StdEvaluationContext::new(&request);
        let elements: Vec<CombiningElement<'_, Fixed>> =
            children.iter().map(|child| CombiningElement::new(child, &[])).collect();
        algorithm.combine(&context, &elements, &[], None)
    }

    pub fn obligation_ids(result: &EvaluationResult) -> Vec<&str> {
        result.obligations.iter().map(|o| o.id.as_str()).collect()
    }
}
