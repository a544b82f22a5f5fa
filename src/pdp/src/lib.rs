//! # CretoAI Policy Decision Point
//!
//! XACML 3.0 policy decision engine: policy trees of rules, policies and
//! policy sets evaluated against attribute requests.
//!
//! ## Features
//!
//! - **Standard combining algorithms** with extended Indeterminate {D, P, DP}
//! - **Lazy function arguments** evaluated at most once, on demand
//! - **ISO-8601 date/time arithmetic** with day-time and year-month durations
//! - **PIP chain** for attributes missing from the request, cached per request
//! - **Policy repository** loading root and referenced policies from files or URLs
//! - **Decision tracing** through a pluggable trace engine
//!
//! ## Example
//!
//! ```rust,ignore
//! use cretoai_pdp::{PdpEngine, Request, Decision};
//!
//! let engine = PdpEngine::with_policy_finder(finder);
//!
//! let request = Request::new()
//!     .with_attribute(CATEGORY_ACCESS_SUBJECT, ID_SUBJECT_SUBJECT_ID, AttributeValue::string("alice"))
//!     .with_attribute(CATEGORY_ACTION, ID_ACTION_ACTION_ID, AttributeValue::string("read"));
//!
//! let response = engine.decide(&request);
//! if response.decision() == Decision::Permit {
//!     println!("Access granted!");
//! }
//! ```

pub mod bag;
pub mod combining;
pub mod config;
pub mod datatypes;
pub mod engine;
pub mod error;
pub mod eval;
pub mod expression;
pub mod finder;
pub mod function;
pub mod identifier;
pub mod pip;
pub mod policy;
pub mod status;
pub mod trace;

// Re-export commonly used types
pub use bag::Bag;
pub use config::PdpConfig;
pub use datatypes::{AttributeValue, DataType, Value};
pub use engine::PdpEngine;
pub use error::{PdpError, Result};
pub use eval::{Decision, EvaluationContext, Request, Response};
pub use identifier::Identifier;
pub use policy::{Effect, ParseMode, Policy, PolicyDef, PolicySet, Rule};
pub use status::Status;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
