//! Request evaluation: requests, responses, decisions and the per-request
//! evaluation context

pub mod context;
pub mod decision;
pub mod factory;
pub mod request;
pub mod response;

pub use context::{EvaluationContext, StdEvaluationContext};
pub use decision::{Decision, EvaluationResult};
pub use factory::{EvaluationContextFactory, PipFinderFactory, PolicyFinderFactory, TraceEngineFactory};
pub use request::{Attribute, Request, RequestAttributes};
pub use response::{DecisionResult, Response};
