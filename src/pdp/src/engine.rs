//! Policy decision point facade
//!
//! [`PdpEngine`] turns a [`Request`] into a [`Response`]:
//!
//! ```text
//! Request → EvaluationContext → PolicyFinder (root) → PolicySet/Policy → combining → Response
//!                  ↓                                        ↓
//!          PIP chain (attributes)                     TraceEngine
//! ```
//!
//! Evaluation is synchronous. `decide_async` moves it onto the blocking pool
//! and enforces the configured decision timeout at that boundary.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{PdpConfig, TraceMode};
use crate::error::{PdpError, Result};
use crate::eval::{Decision, EvaluationContext, EvaluationContextFactory, EvaluationResult, Request, Response};
use crate::finder::{PolicyFinder, PolicyFinderResult, PolicyLoader, PolicyRepository};
use crate::status::Status;
use crate::trace::{LoggingTraceEngine, TraceEngine};

/// Policy decision point. Cheap to clone; clones share finders.
#[derive(Clone)]
pub struct PdpEngine {
    contexts: Arc<EvaluationContextFactory>,
    decision_timeout: Option<Duration>,
}

impl PdpEngine {
    pub fn new(contexts: EvaluationContextFactory) -> Self {
        info!("PdpEngine initialized: {:?}", contexts);
        Self {
            contexts: Arc::new(contexts),
            decision_timeout: None,
        }
    }

    /// Engine over a ready-made policy finder with default PIP and trace
    pub fn with_policy_finder(finder: Arc<dyn PolicyFinder>) -> Self {
        Self::new(EvaluationContextFactory::new().with_policy_finder(finder))
    }

    /// Load the configured policies and build an engine over them
    pub async fn from_config(config: &PdpConfig, loader: &dyn PolicyLoader) -> Result<Self> {
        let repository = PolicyRepository::load(config, loader).await?;
        if repository.roots.is_empty() && !config.root_policies.is_empty() {
            return Err(PdpError::PolicyNotFound(format!(
                "None of the root policies could be loaded: {}",
                config.root_policies.join(", ")
            )));
        }

        let mut contexts = EvaluationContextFactory::new().with_policy_finder(Arc::new(repository.into_finder()));
        if config.trace == TraceMode::Log {
            let engine: Arc<dyn TraceEngine> = Arc::new(LoggingTraceEngine);
            contexts = contexts.with_trace_engine(engine);
        }

        Ok(Self::new(contexts).with_decision_timeout(config.decision_timeout()))
    }

    /// Timeout applied by [`decide_async`](Self::decide_async)
    pub fn with_decision_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.decision_timeout = timeout;
        self
    }

    pub fn contexts(&self) -> &EvaluationContextFactory {
        &self.contexts
    }

    /// Evaluate a request
    pub fn decide(&self, request: &Request) -> Response {
        let start = Instant::now();

        // Step 1: Per-request context
        let context = self.contexts.create_context(request);
        debug!("Decision request {} with {} categories", context.request_id(), request.categories.len());

        // Step 2: Root policy
        let result = match context.root_policy() {
            PolicyFinderResult::Found(policy) => {
                debug!("Evaluating root policy {}", policy.id());
                policy.evaluate(&context)
            }
            PolicyFinderResult::NotFound => {
                debug!("No applicable root policy");
                EvaluationResult::not_applicable()
            }
            PolicyFinderResult::Error(status) => {
                warn!("Root policy lookup failed: {}", status);
                EvaluationResult::indeterminate(Decision::IndeterminateDenyPermit, status)
            }
        };

        // Step 3: Response
        let response = Response::from_evaluation(request, result);
        debug!(
            "Request {} decided {} in {:?}",
            context.request_id(),
            response.decision(),
            start.elapsed()
        );
        response
    }

    /// Evaluate on the blocking pool, bounded by the decision timeout
    pub async fn decide_async(&self, request: Request) -> Response {
        let engine = self.clone();
        let request = Arc::new(request);
        let task_request = Arc::clone(&request);
        let task = tokio::task::spawn_blocking(move || engine.decide(&task_request));

        let joined = match self.decision_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    let err = PdpError::Timeout(timeout.as_millis() as u64);
                    warn!("{}", err);
                    return Response::indeterminate(&request, Status::processing_error(err.to_string()));
                }
            },
            None => task.await,
        };

        joined.unwrap_or_else(|e| {
            error!("Decision task failed: {}", e);
            Response::indeterminate(&request, Status::processing_error(format!("Decision task failed: {}", e)))
        })
    }
}

impl std::fmt::Debug for PdpEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdpEngine")
            .field("contexts", &self.contexts)
            .field("decision_timeout", &self.decision_timeout)
            .finish()
    }
}
