use serde::{Deserialize, Serialize};

use super::{Decision, EvaluationResult, Request, RequestAttributes};
use crate::policy::{Advice, Obligation, PolicyIdentifier};
use crate::status::Status;

/// The decision reported for a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    /// Permit, Deny, Indeterminate or NotApplicable
    pub decision: Decision,
    pub status: Status,
    #[serde(default)]
    pub obligations: Vec<Obligation>,
    #[serde(default)]
    pub advice: Vec<Advice>,
    /// Request attributes flagged `include_in_result`
    #[serde(default)]
    pub attributes: Vec<RequestAttributes>,
    #[serde(default)]
    pub policy_identifiers: Vec<PolicyIdentifier>,
}

/// Response to a decision request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub result: DecisionResult,
}

impl Response {
    /// Build the caller-facing response from an evaluation result
    pub fn from_evaluation(request: &Request, result: EvaluationResult) -> Self {
        let decision = result.decision.collapse();
        // obligations and advice only accompany Permit or Deny
        let (obligations, advice) = match decision {
            Decision::Permit | Decision::Deny => (result.obligations, result.advice),
            _ => (Vec::new(), Vec::new()),
        };
        let policy_identifiers = if request.return_policy_id_list {
            result.policy_identifiers
        } else {
            Vec::new()
        };

        Self {
            result: DecisionResult {
                decision,
                status: result.status,
                obligations,
                advice,
                attributes: request.include_in_result_attributes(),
                policy_identifiers,
            },
        }
    }

    /// Indeterminate response for a failure outside policy evaluation
    pub fn indeterminate(request: &Request, status: Status) -> Self {
        Self::from_evaluation(
            request,
            EvaluationResult::indeterminate(Decision::IndeterminateDenyPermit, status),
        )
    }

    pub fn decision(&self) -> Decision {
        self.result.decision
    }

    pub fn status(&self) -> &Status {
        &self.result.status
    }

    pub fn obligations(&self) -> &[Obligation] {
        &self.result.obligations
    }

    pub fn advice(&self) -> &[Advice] {
        &self.result.advice
    }
}
