//! Long-lived factory for per-request evaluation contexts
//!
//! The factory owns the three shared collaborators every context needs: the
//! policy finder, the attribute resolver chain, and the trace engine. Each is
//! built at most once, on first use, through
//! [`OnceCell::get_or_try_init`]: concurrent first callers block only while
//! that one construction runs, and later reads are lock-free.
//!
//! A construction failure is logged and reported as `None`; the cell stays
//! empty, so the next call tries again. A policy finder with neither an
//! instance nor a factory is reported at `error` level once, then at `debug`.

use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::{Request, StdEvaluationContext};
use crate::error::{PdpError, Result};
use crate::finder::PolicyFinder;
use crate::function::FunctionRegistry;
use crate::pip::{EnvironmentEngine, PipFinder, StdPipFinder};
use crate::trace::{NullTraceEngine, TraceEngine};

/// Builds the policy finder on first use
pub trait PolicyFinderFactory: Send + Sync {
    fn policy_finder(&self) -> Result<Arc<dyn PolicyFinder>>;
}

/// Builds the attribute resolver chain on first use
pub trait PipFinderFactory: Send + Sync {
    fn pip_finder(&self) -> Result<Arc<dyn PipFinder>>;
}

/// Builds the trace engine on first use
pub trait TraceEngineFactory: Send + Sync {
    fn trace_engine(&self) -> Result<Arc<dyn TraceEngine>>;
}

/// Creates [`StdEvaluationContext`]s that share lazily built finders
pub struct EvaluationContextFactory {
    functions: Arc<FunctionRegistry>,
    policy_finder: OnceCell<Arc<dyn PolicyFinder>>,
    pip_finder: OnceCell<Arc<dyn PipFinder>>,
    trace_engine: OnceCell<Arc<dyn TraceEngine>>,
    policy_finder_factory: Option<Arc<dyn PolicyFinderFactory>>,
    pip_finder_factory: Option<Arc<dyn PipFinderFactory>>,
    trace_engine_factory: Option<Arc<dyn TraceEngineFactory>>,
    missing_policy_finder_reported: AtomicBool,
}

impl Default for EvaluationContextFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationContextFactory {
    pub fn new() -> Self {
        Self {
            functions: FunctionRegistry::standard(),
            policy_finder: OnceCell::new(),
            pip_finder: OnceCell::new(),
            trace_engine: OnceCell::new(),
            policy_finder_factory: None,
            pip_finder_factory: None,
            trace_engine_factory: None,
            missing_policy_finder_reported: AtomicBool::new(false),
        }
    }

    /// Use a ready-made policy finder; no lazy construction happens
    pub fn with_policy_finder(mut self, finder: Arc<dyn PolicyFinder>) -> Self {
        self.policy_finder = OnceCell::with_value(finder);
        self
    }

    pub fn with_policy_finder_factory(mut self, factory: Arc<dyn PolicyFinderFactory>) -> Self {
        self.policy_finder_factory = Some(factory);
        self
    }

    /// Use a ready-made resolver chain; no lazy construction happens
    pub fn with_pip_finder(mut self, finder: Arc<dyn PipFinder>) -> Self {
        self.pip_finder = OnceCell::with_value(finder);
        self
    }

    pub fn with_pip_finder_factory(mut self, factory: Arc<dyn PipFinderFactory>) -> Self {
        self.pip_finder_factory = Some(factory);
        self
    }

    /// Use a ready-made trace engine; no lazy construction happens
    pub fn with_trace_engine(mut self, engine: Arc<dyn TraceEngine>) -> Self {
        self.trace_engine = OnceCell::with_value(engine);
        self
    }

    pub fn with_trace_engine_factory(mut self, factory: Arc<dyn TraceEngineFactory>) -> Self {
        self.trace_engine_factory = Some(factory);
        self
    }

    pub fn with_functions(mut self, functions: Arc<FunctionRegistry>) -> Self {
        self.functions = functions;
        self
    }

    pub fn functions(&self) -> &Arc<FunctionRegistry> {
        &self.functions
    }

    /// The shared policy finder, or `None` if it cannot be built
    pub fn policy_finder(&self) -> Option<Arc<dyn PolicyFinder>> {
        if let Some(finder) = self.policy_finder.get() {
            return Some(Arc::clone(finder));
        }
        let Some(factory) = &self.policy_finder_factory else {
            if self.missing_policy_finder_reported.swap(true, Ordering::Relaxed) {
                debug!("No policy finder configured");
            } else {
                error!("No policy finder configured");
            }
            return None;
        };

        self.policy_finder
            .get_or_try_init(|| {
                let finder = factory.policy_finder()?;
                info!("Policy finder initialized");
                Ok::<_, PdpError>(finder)
            })
            .map_err(|e| error!("Failed to create policy finder: {}", e))
            .ok()
            .cloned()
    }

    /// The shared resolver chain, or `None` if it cannot be built.
    ///
    /// Without a factory the chain holds only the environment engine.
    pub fn pip_finder(&self) -> Option<Arc<dyn PipFinder>> {
        self.pip_finder
            .get_or_try_init(|| match &self.pip_finder_factory {
                Some(factory) => factory.pip_finder(),
                None => {
                    let finder: Arc<dyn PipFinder> =
                        Arc::new(StdPipFinder::new(vec![Arc::new(EnvironmentEngine::new())]));
                    Ok(finder)
                }
            })
            .map_err(|e| error!("Failed to create PIP finder: {}", e))
            .ok()
            .cloned()
    }

    /// The shared trace engine, or `None` if it cannot be built
    pub fn trace_engine(&self) -> Option<Arc<dyn TraceEngine>> {
        self.trace_engine
            .get_or_try_init(|| match &self.trace_engine_factory {
                Some(factory) => factory.trace_engine(),
                None => {
                    let engine: Arc<dyn TraceEngine> = Arc::new(NullTraceEngine);
                    Ok(engine)
                }
            })
            .map_err(|e| error!("Failed to create trace engine: {}", e))
            .ok()
            .cloned()
    }

    /// A fresh context for one request
    pub fn create_context<'r>(&self, request: &'r Request) -> StdEvaluationContext<'r> {
        StdEvaluationContext::new(request)
            .with_functions(Arc::clone(&self.functions))
            .with_policy_finder(self.policy_finder())
            .with_pip_finder(self.pip_finder())
            .with_trace_engine(self.trace_engine())
    }
}

impl fmt::Debug for EvaluationContextFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContextFactory")
            .field("functions", &self.functions.len())
            .field("policy_finder", &self.policy_finder.get().is_some())
            .field("pip_finder", &self.pip_finder.get().is_some())
            .field("trace_engine", &self.trace_engine.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::EvaluationContext;
    use crate::finder::StdPolicyFinder;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::atomic::AtomicUsize;

    struct FlakyFinderFactory {
        attempts: AtomicUsize,
    }

    impl PolicyFinderFactory for FlakyFinderFactory {
        fn policy_finder(&self) -> Result<Arc<dyn PolicyFinder>> {
            if self.attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(PdpError::Load("store not ready".to_string()));
            }
            Ok(Arc::new(StdPolicyFinder::default()))
        }
    }

    #[test]
    fn test_failed_construction_is_retried() {
        let factory = Arc::new(FlakyFinderFactory { attempts: AtomicUsize::new(0) });
        let contexts = EvaluationContextFactory::new().with_policy_finder_factory(factory.clone());

        assert!(contexts.policy_finder().is_none());
        assert!(contexts.policy_finder().is_some());
        assert!(contexts.policy_finder().is_some());
        assert_eq!(factory.attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_supplied_instance_skips_factory() {
        let factory = Arc::new(FlakyFinderFactory { attempts: AtomicUsize::new(0) });
        let contexts = EvaluationContextFactory::new()
            .with_policy_finder(Arc::new(StdPolicyFinder::default()))
            .with_policy_finder_factory(factory.clone());

        assert!(contexts.policy_finder().is_some());
        assert_eq!(factory.attempts.load(Ordering::SeqCst), 0);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn lines_at(&self, level: &str) -> usize {
            let contents = String::from_utf8_lossy(&self.0.lock()).into_owned();
            contents
                .lines()
                .filter(|line| line.contains(level) && line.contains("No policy finder configured"))
                .count()
        }
    }

    #[test]
    fn test_missing_policy_finder_logged_as_error_once() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let contexts = EvaluationContextFactory::new();
            for _ in 0..3 {
                assert!(contexts.policy_finder().is_none());
            }
        });

        assert_eq!(log.lines_at("ERROR"), 1);
        assert_eq!(log.lines_at("DEBUG"), 2);
    }

    #[test]
    fn test_defaults() {
        let contexts = EvaluationContextFactory::new();
        assert!(contexts.policy_finder().is_none());
        assert!(contexts.pip_finder().is_some());

        let request = Request::new();
        let context = contexts.create_context(&request);
        assert!(!context.is_tracing());
    }
}
