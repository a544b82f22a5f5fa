//! Policy finders
//!
//! A [`PolicyFinder`] supplies the root policy for a request and resolves
//! `PolicyIdReference` / `PolicySetIdReference` elements during evaluation.
//! [`StdPolicyFinder`] holds an in-memory set of root and referenced
//! policies, typically produced by [`repository::PolicyRepository`].

pub mod repository;

use std::sync::Arc;
use tracing::debug;

use crate::eval::EvaluationContext;
use crate::policy::{IdReference, MatchResult, PolicyDef, ReferenceKind};
use crate::status::Status;

pub use repository::{PolicyLoader, PolicyRepository};

/// Outcome of a policy lookup
#[derive(Debug, Clone)]
pub enum PolicyFinderResult {
    Found(Arc<PolicyDef>),
    NotFound,
    Error(Status),
}

impl PolicyFinderResult {
    pub fn is_found(&self) -> bool {
        matches!(self, PolicyFinderResult::Found(_))
    }
}

/// Locates root and referenced policies
pub trait PolicyFinder: Send + Sync {
    /// The policy a request is evaluated against
    fn root_policy(&self, context: &dyn EvaluationContext) -> PolicyFinderResult;

    /// Resolve a reference to the highest matching version
    fn policy(&self, reference: &IdReference, kind: ReferenceKind) -> PolicyFinderResult;
}

/// In-memory policy finder
#[derive(Debug, Default, Clone)]
pub struct StdPolicyFinder {
    roots: Vec<Arc<PolicyDef>>,
    referenced: Vec<Arc<PolicyDef>>,
}

impl StdPolicyFinder {
    pub fn new(roots: Vec<Arc<PolicyDef>>, referenced: Vec<Arc<PolicyDef>>) -> Self {
        Self { roots, referenced }
    }

    /// Finder with a single root
    pub fn with_root(root: impl Into<Arc<PolicyDef>>) -> Self {
        Self::new(vec![root.into()], Vec::new())
    }

    pub fn add_root(&mut self, policy: Arc<PolicyDef>) {
        self.roots.push(policy);
    }

    pub fn add_referenced(&mut self, policy: Arc<PolicyDef>) {
        self.referenced.push(policy);
    }

    pub fn roots(&self) -> &[Arc<PolicyDef>] {
        &self.roots
    }

    pub fn referenced(&self) -> &[Arc<PolicyDef>] {
        &self.referenced
    }
}

impl PolicyFinder for StdPolicyFinder {
    fn root_policy(&self, context: &dyn EvaluationContext) -> PolicyFinderResult {
        match self.roots.as_slice() {
            [] => PolicyFinderResult::NotFound,
            [only] => PolicyFinderResult::Found(Arc::clone(only)),
            roots => {
                let mut selected: Option<&Arc<PolicyDef>> = None;
                for root in roots {
                    match root.match_target(context) {
                        MatchResult::Match => {
                            if selected.is_some() {
                                return PolicyFinderResult::Error(Status::processing_error(
                                    "More than one applicable root policy",
                                ));
                            }
                            selected = Some(root);
                        }
                        MatchResult::NoMatch => {}
                        MatchResult::Indeterminate(status) => return PolicyFinderResult::Error(status),
                    }
                }
                match selected {
                    Some(root) => {
                        debug!("Selected root policy {}", root.id());
                        PolicyFinderResult::Found(Arc::clone(root))
                    }
                    None => PolicyFinderResult::NotFound,
                }
            }
        }
    }

    fn policy(&self, reference: &IdReference, kind: ReferenceKind) -> PolicyFinderResult {
        let best = self
            .roots
            .iter()
            .chain(self.referenced.iter())
            .filter(|policy| policy.kind() == kind && reference.matches(policy.id(), policy.version()))
            .max_by(|a, b| a.version().cmp(b.version()));

        match best {
            Some(policy) => PolicyFinderResult::Found(Arc::clone(policy)),
            None => {
                debug!("No policy matches reference {}", reference);
                PolicyFinderResult::NotFound
            }
        }
    }
}
