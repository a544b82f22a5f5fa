//! Function lookup by identifier

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::FunctionDefinition;
use crate::identifier::Identifier;

static STANDARD: Lazy<Arc<FunctionRegistry>> = Lazy::new(|| {
    let mut registry = FunctionRegistry::new();
    super::equality::register(&mut registry);
    super::arithmetic::register(&mut registry);
    super::comparison::register(&mut registry);
    super::logical::register(&mut registry);
    super::string::register(&mut registry);
    super::bag::register(&mut registry);
    super::set::register(&mut registry);
    super::datetime::register(&mut registry);
    debug!("Standard function registry built with {} functions", registry.len());
    Arc::new(registry)
});

/// Function definitions keyed by identifier
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<Identifier, Arc<dyn FunctionDefinition>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry of every built-in function, built on first use
    pub fn standard() -> Arc<FunctionRegistry> {
        Arc::clone(&STANDARD)
    }

    /// Add a function, replacing any previous definition with the same id
    pub fn register(&mut self, function: Arc<dyn FunctionDefinition>) {
        self.functions.insert(function.id().clone(), function);
    }

    pub fn get(&self, id: &Identifier) -> Option<Arc<dyn FunctionDefinition>> {
        self.functions.get(id).cloned()
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.functions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &Identifier> {
        self.functions.keys()
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier;

    #[test]
    fn test_standard_registry_contents() {
        let registry = FunctionRegistry::standard();
        for id in [
            identifier::FUNCTION_STRING_EQUAL,
            identifier::FUNCTION_AND,
            identifier::FUNCTION_INTEGER_GREATER_THAN,
            identifier::FUNCTION_STRING_ONE_AND_ONLY,
            identifier::FUNCTION_STRING_REGEXP_MATCH,
            identifier::FUNCTION_DATE_SUBTRACT_YEARMONTHDURATION,
            Identifier::function_v1("integer-bag-size"),
            Identifier::function_v1("string-set-equals"),
            Identifier::function_v3("dayTimeDuration-equal"),
            Identifier::function_v2("string-concatenate"),
        ] {
            assert!(registry.contains(&id), "missing {}", id);
        }
    }

    #[test]
    fn test_standard_registry_is_shared() {
        assert!(Arc::ptr_eq(&FunctionRegistry::standard(), &FunctionRegistry::standard()));
    }

    #[test]
    fn test_short_id() {
        let registry = FunctionRegistry::standard();
        let function = registry.get(&identifier::FUNCTION_DATETIME_ADD_DAYTIMEDURATION).unwrap();
        assert_eq!(function.short_id(), "dateTime-add-dayTimeDuration");
        assert!(!function.returns_bag());
    }
}
