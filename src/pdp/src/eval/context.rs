use dashmap::DashMap;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::Request;
use crate::finder::{PolicyFinder, PolicyFinderResult};
use crate::function::{FunctionDefinition, FunctionRegistry};
use crate::identifier::Identifier;
use crate::pip::{AttributeRequest, PipFinder, PipResponse};
use crate::policy::{IdReference, ReferenceKind};
use crate::status::Status;
use crate::trace::{TraceEngine, TraceEvent};

/// Per-request view of the request, functions, policies and attribute
/// sources
pub trait EvaluationContext: Send + Sync {
    fn request(&self) -> &Request;

    fn request_id(&self) -> Uuid;

    /// Values for an attribute, from the request or the resolver chain
    fn attributes(&self, request: &AttributeRequest) -> PipResponse;

    /// Structured content of a category, for attribute selectors
    fn content(&self, category: &Identifier) -> Option<&JsonValue> {
        self.request().content(category)
    }

    fn function(&self, id: &Identifier) -> Option<Arc<dyn FunctionDefinition>>;

    fn root_policy(&self) -> PolicyFinderResult;

    fn policy(&self, reference: &IdReference, kind: ReferenceKind) -> PolicyFinderResult;

    fn is_tracing(&self) -> bool {
        false
    }

    fn trace(&self, _event: TraceEvent) {}
}

/// Standard evaluation context, scoped to one request
pub struct StdEvaluationContext<'r> {
    request: &'r Request,
    request_id: Uuid,
    functions: Arc<FunctionRegistry>,
    policy_finder: Option<Arc<dyn PolicyFinder>>,
    pip_finder: Option<Arc<dyn PipFinder>>,
    trace_engine: Option<Arc<dyn TraceEngine>>,
    /// Resolved attributes, kept for the lifetime of the request
    attribute_cache: DashMap<AttributeRequest, PipResponse>,
}

impl<'r> StdEvaluationContext<'r> {
    pub fn new(request: &'r Request) -> Self {
        Self {
            request,
            request_id: Uuid::new_v4(),
            functions: FunctionRegistry::standard(),
            policy_finder: None,
            pip_finder: None,
            trace_engine: None,
            attribute_cache: DashMap::new(),
        }
    }

    pub fn with_functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_policy_finder(mut self, finder: Option<Arc<dyn PolicyFinder>>) -> Self {
        self.policy_finder = finder;
        self
    }

    pub fn with_pip_finder(mut self, finder: Option<Arc<dyn PipFinder>>) -> Self {
        self.pip_finder = finder;
        self
    }

    pub fn with_trace_engine(mut self, engine: Option<Arc<dyn TraceEngine>>) -> Self {
        self.trace_engine = engine;
        self
    }

    fn resolve(&self, request: &AttributeRequest) -> PipResponse {
        let bag = self.request.attribute_values(request);
        if !bag.is_empty() {
            return PipResponse::ok(bag);
        }
        match &self.pip_finder {
            Some(finder) => finder.attributes(request),
            None => PipResponse::empty(),
        }
    }
}

impl<'r> EvaluationContext for StdEvaluationContext<'r> {
    fn request(&self) -> &Request {
        self.request
    }

    fn request_id(&self) -> Uuid {
        self.request_id
    }

    fn attributes(&self, request: &AttributeRequest) -> PipResponse {
        if let Some(cached) = self.attribute_cache.get(request) {
            return cached.clone();
        }

        // Resolved without holding a map guard; concurrent lookups of the same
        // attribute may both resolve, the first insert wins.
        let response = self.resolve(request);
        debug!(
            "Resolved {} to {} value(s) for request {}",
            request.attribute_id,
            response.bag.size(),
            self.request_id
        );
        self.attribute_cache
            .entry(request.clone())
            .or_insert(response)
            .clone()
    }

    fn function(&self, id: &Identifier) -> Option<Arc<dyn FunctionDefinition>> {
        self.functions.get(id)
    }

    fn root_policy(&self) -> PolicyFinderResult {
        match &self.policy_finder {
            Some(finder) => finder.root_policy(self),
            None => PolicyFinderResult::Error(Status::processing_error("No policy finder available")),
        }
    }

    fn policy(&self, reference: &IdReference, kind: ReferenceKind) -> PolicyFinderResult {
        match &self.policy_finder {
            Some(finder) => finder.policy(reference, kind),
            None => PolicyFinderResult::Error(Status::processing_error("No policy finder available")),
        }
    }

    fn is_tracing(&self) -> bool {
        self.trace_engine.as_ref().map_or(false, |engine| engine.is_tracing())
    }

    fn trace(&self, event: TraceEvent) {
        if let Some(engine) = &self.trace_engine {
            engine.trace(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::Bag;
    use crate::datatypes::AttributeValue;
    use crate::error::PipError;
    use crate::identifier::{CATEGORY_ACCESS_SUBJECT, DATATYPE_STRING, ID_SUBJECT_SUBJECT_ID};
    use crate::pip::{PipEngine, StdPipFinder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl PipEngine for CountingEngine {
        fn name(&self) -> &str {
            "counting"
        }

        fn supports(&self, _request: &AttributeRequest) -> bool {
            true
        }

        fn resolve(&self, _request: &AttributeRequest, _finder: &dyn PipFinder) -> Result<Bag, PipError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(std::iter::once(AttributeValue::string("engineering")).collect())
        }
    }

    #[test]
    fn test_request_attributes_win_over_pip() {
        let engine = Arc::new(CountingEngine { calls: AtomicUsize::new(0) });
        let request = Request::new().with_attribute(
            CATEGORY_ACCESS_SUBJECT,
            ID_SUBJECT_SUBJECT_ID,
            AttributeValue::string("alice"),
        );
        let context = StdEvaluationContext::new(&request)
            .with_pip_finder(Some(Arc::new(StdPipFinder::new(vec![engine.clone()]))));

        let response = context.attributes(&AttributeRequest::new(
            CATEGORY_ACCESS_SUBJECT,
            ID_SUBJECT_SUBJECT_ID,
            DATATYPE_STRING,
        ));
        assert_eq!(response.bag.values(), &[AttributeValue::string("alice")]);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_pip_result_is_cached_per_request() {
        let engine = Arc::new(CountingEngine { calls: AtomicUsize::new(0) });
        let request = Request::new();
        let context = StdEvaluationContext::new(&request)
            .with_pip_finder(Some(Arc::new(StdPipFinder::new(vec![engine.clone()]))));
        let department = AttributeRequest::new(CATEGORY_ACCESS_SUBJECT, Identifier::new("urn:test:dept"), DATATYPE_STRING);

        assert_eq!(context.attributes(&department).bag.size(), 1);
        assert_eq!(context.attributes(&department).bag.size(), 1);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_policy_finder() {
        let request = Request::new();
        let context = StdEvaluationContext::new(&request);
        assert!(matches!(context.root_policy(), PolicyFinderResult::Error(_)));
    }
}
