//! Attribute resolution (Policy Information Points)
//!
//! When a designator cannot be satisfied from the request, the evaluation
//! context asks a [`PipFinder`]. The standard finder walks an ordered chain of
//! [`PipEngine`]s: each engine is first asked whether it `supports` the
//! request, and only then asked to `resolve` it.
//!
//! # Features
//!
//! - Capability probe before fetch, so incompatible engines are skipped cheaply
//! - A failing engine is logged and skipped; the chain keeps going
//! - First non-empty bag wins

pub mod environment;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::bag::Bag;
use crate::error::PipError;
use crate::identifier::Identifier;
use crate::status::Status;

pub use environment::EnvironmentEngine;

/// Identifies one attribute to resolve
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeRequest {
    pub category: Identifier,
    pub attribute_id: Identifier,
    pub data_type: Identifier,
    #[serde(default)]
    pub issuer: Option<Identifier>,
}

impl AttributeRequest {
    pub fn new(category: Identifier, attribute_id: Identifier, data_type: Identifier) -> Self {
        Self {
            category,
            attribute_id,
            data_type,
            issuer: None,
        }
    }
}

/// Status plus the values found (possibly none)
#[derive(Debug, Clone, PartialEq)]
pub struct PipResponse {
    pub status: Status,
    pub bag: Bag,
}

impl PipResponse {
    pub fn ok(bag: Bag) -> Self {
        Self {
            status: Status::ok(),
            bag,
        }
    }

    pub fn empty() -> Self {
        Self::ok(Bag::new())
    }

    pub fn error(status: Status) -> Self {
        Self {
            status,
            bag: Bag::new(),
        }
    }
}

/// A single attribute source
pub trait PipEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap capability check, called before `resolve`
    fn supports(&self, request: &AttributeRequest) -> bool;

    /// Fetch values. `finder` lets an engine look up attributes it depends on.
    fn resolve(&self, request: &AttributeRequest, finder: &dyn PipFinder) -> Result<Bag, PipError>;
}

/// Resolves attributes on behalf of the evaluation context
pub trait PipFinder: Send + Sync {
    fn attributes(&self, request: &AttributeRequest) -> PipResponse;
}

/// Ordered chain of [`PipEngine`]s
#[derive(Default, Clone)]
pub struct StdPipFinder {
    engines: Vec<Arc<dyn PipEngine>>,
}

impl StdPipFinder {
    pub fn new(engines: Vec<Arc<dyn PipEngine>>) -> Self {
        Self { engines }
    }

    pub fn with_engine(mut self, engine: Arc<dyn PipEngine>) -> Self {
        self.engines.push(engine);
        self
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl PipFinder for StdPipFinder {
    fn attributes(&self, request: &AttributeRequest) -> PipResponse {
        let mut attempted = 0usize;
        let mut failures = Vec::new();

        for engine in self.engines.iter().filter(|engine| engine.supports(request)) {
            attempted += 1;
            match engine.resolve(request, self) {
                Ok(bag) if !bag.is_empty() => {
                    debug!(
                        "PIP engine {} resolved {} value(s) for {}",
                        engine.name(),
                        bag.size(),
                        request.attribute_id
                    );
                    return PipResponse::ok(bag);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("PIP engine {} failed for {}: {}", engine.name(), request.attribute_id, e);
                    failures.push(format!("{}: {}", engine.name(), e));
                }
            }
        }

        if attempted > 0 && failures.len() == attempted {
            return PipResponse::error(Status::processing_error(format!(
                "Failed to resolve \"{}\": {}",
                request.attribute_id,
                failures.join("; ")
            )));
        }
        PipResponse::empty()
    }
}

impl std::fmt::Debug for StdPipFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.engines.iter().map(|engine| engine.name()).collect();
        f.debug_struct("StdPipFinder").field("engines", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::AttributeValue;
    use crate::identifier::{CATEGORY_RESOURCE, DATATYPE_STRING};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedEngine {
        name: &'static str,
        supported: bool,
        result: std::result::Result<Vec<&'static str>, &'static str>,
        calls: AtomicUsize,
    }

    impl FixedEngine {
        fn new(name: &'static str, supported: bool, result: std::result::Result<Vec<&'static str>, &'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                supported,
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl PipEngine for FixedEngine {
        fn name(&self) -> &str {
            self.name
        }

        fn supports(&self, _request: &AttributeRequest) -> bool {
            self.supported
        }

        fn resolve(&self, _request: &AttributeRequest, _finder: &dyn PipFinder) -> Result<Bag, PipError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(values) => Ok(values.iter().map(|v| AttributeValue::string(*v)).collect()),
                Err(message) => Err(PipError::Unavailable(message.to_string())),
            }
        }
    }

    fn owner_request() -> AttributeRequest {
        AttributeRequest::new(CATEGORY_RESOURCE, Identifier::new("urn:test:owner"), DATATYPE_STRING)
    }

    #[test]
    fn test_chain_continues_past_failure() {
        let failing = FixedEngine::new("failing", true, Err("connection refused"));
        let working = FixedEngine::new("working", true, Ok(vec!["alice"]));
        let finder = StdPipFinder::new(vec![failing.clone(), working.clone()]);

        let response = finder.attributes(&owner_request());
        assert!(response.status.is_ok());
        assert_eq!(response.bag.size(), 1);
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsupported_engine_is_not_resolved() {
        let unsupported = FixedEngine::new("unsupported", false, Ok(vec!["x"]));
        let finder = StdPipFinder::new(vec![unsupported.clone()]);

        let response = finder.attributes(&owner_request());
        assert!(response.status.is_ok());
        assert!(response.bag.is_empty());
        assert_eq!(unsupported.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_supporting_engines_failed() {
        let finder = StdPipFinder::new(vec![
            FixedEngine::new("a", true, Err("down")),
            FixedEngine::new("b", false, Ok(vec!["x"])),
        ]);

        let response = finder.attributes(&owner_request());
        assert!(!response.status.is_ok());
        assert!(response.status.message().unwrap_or_default().contains("a: "));
    }
}
