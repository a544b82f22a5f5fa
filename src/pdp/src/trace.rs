//! Decision tracing
//!
//! A [`TraceEngine`] receives structured [`TraceEvent`]s while a request is
//! evaluated. The evaluation path checks [`TraceEngine::is_tracing`] before
//! building an event, so the null engine costs nothing.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// One step of an evaluation worth auditing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Id of the policy, rule or component that produced the event
    pub source: String,
    pub message: String,
}

impl TraceEvent {
    pub fn new(request_id: Uuid, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Sink for trace events
pub trait TraceEngine: Send + Sync {
    fn is_tracing(&self) -> bool;

    fn trace(&self, event: TraceEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTraceEngine;

impl TraceEngine for NullTraceEngine {
    fn is_tracing(&self) -> bool {
        false
    }

    fn trace(&self, _event: TraceEvent) {}
}

/// Forwards events to `tracing` at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTraceEngine;

impl TraceEngine for LoggingTraceEngine {
    fn is_tracing(&self) -> bool {
        true
    }

    fn trace(&self, event: TraceEvent) {
        info!(
            request_id = %event.request_id,
            source = %event.source,
            "{}",
            event.message
        );
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct CollectingTraceEngine {
    events: Mutex<Vec<TraceEvent>>,
}

impl CollectingTraceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl TraceEngine for CollectingTraceEngine {
    fn is_tracing(&self) -> bool {
        true
    }

    fn trace(&self, event: TraceEvent) {
        self.events.lock().push(event);
    }
}
