//! String functions

use lru::LruCache;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::{arity_violation, Arity, Compute, FunctionDefinitionHomogeneous, FunctionRegistry};
use crate::datatypes::{DataTypeBoolean, DataTypeString};
use crate::identifier::{self, Identifier};

/// Most compiled patterns kept by the shared cache
pub const REGEX_CACHE_CAPACITY: usize = 256;

/// Compiled patterns keyed by source. Least recently used patterns are
/// evicted once the cache is full.
pub struct RegexCache {
    patterns: Mutex<LruCache<String, Regex>>,
}

impl RegexCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            patterns: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn compiled(&self, pattern: &str) -> Result<Regex, String> {
        if let Some(regex) = self.patterns.lock().get(pattern) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(pattern).map_err(|e| format!("Invalid regular expression \"{}\": {}", pattern, e))?;
        self.patterns.lock().put(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.patterns.lock().contains(pattern)
    }

    pub fn len(&self) -> usize {
        self.patterns.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.patterns.lock().clear();
    }
}

static REGEX_CACHE: Lazy<RegexCache> = Lazy::new(|| RegexCache::new(REGEX_CACHE_CAPACITY));

/// Drops every pattern compiled by `string-regexp-match`
pub fn clear_regex_cache() {
    REGEX_CACHE.clear();
}

fn regexp_match(args: &[String]) -> Result<bool, String> {
    match args {
        [pattern, value] => Ok(REGEX_CACHE.compiled(pattern)?.is_match(value)),
        _ => Err(arity_violation(args.len())),
    }
}

fn concatenate(args: &[String]) -> Result<String, String> {
    Ok(args.concat())
}

/// `(needle, haystack)` predicates
fn substring_test(args: &[String], test: fn(&str, &str) -> bool) -> Result<bool, String> {
    match args {
        [needle, haystack] => Ok(test(haystack, needle)),
        _ => Err(arity_violation(args.len())),
    }
}

fn starts_with(args: &[String]) -> Result<bool, String> {
    substring_test(args, |haystack, needle| haystack.starts_with(needle))
}

fn ends_with(args: &[String]) -> Result<bool, String> {
    substring_test(args, |haystack, needle| haystack.ends_with(needle))
}

fn contains(args: &[String]) -> Result<bool, String> {
    substring_test(args, |haystack, needle| haystack.contains(needle))
}

fn normalize_space(args: &[String]) -> Result<String, String> {
    match args {
        [value] => Ok(value.trim().to_string()),
        _ => Err(arity_violation(args.len())),
    }
}

fn normalize_to_lower_case(args: &[String]) -> Result<String, String> {
    match args {
        [value] => Ok(value.to_lowercase()),
        _ => Err(arity_violation(args.len())),
    }
}

fn predicate(registry: &mut FunctionRegistry, id: Identifier, compute: Compute<DataTypeString, DataTypeBoolean>) {
    registry.register(Arc::new(FunctionDefinitionHomogeneous::<DataTypeString, DataTypeBoolean>::new(
        id,
        Arity::Exact(2),
        compute,
    )));
}

fn transform(registry: &mut FunctionRegistry, id: Identifier, arity: Arity, compute: Compute<DataTypeString, DataTypeString>) {
    registry.register(Arc::new(FunctionDefinitionHomogeneous::<DataTypeString, DataTypeString>::new(
        id, arity, compute,
    )));
}

pub(crate) fn register(registry: &mut FunctionRegistry) {
    predicate(registry, identifier::FUNCTION_STRING_REGEXP_MATCH, regexp_match);
    predicate(registry, Identifier::function_v3("string-starts-with"), starts_with);
    predicate(registry, Identifier::function_v3("string-ends-with"), ends_with);
    predicate(registry, Identifier::function_v3("string-contains"), contains);

    transform(registry, Identifier::function_v2("string-concatenate"), Arity::AtLeast(2), concatenate);
    transform(registry, Identifier::function_v1("string-normalize-space"), Arity::Exact(1), normalize_space);
    transform(
        registry,
        Identifier::function_v1("string-normalize-to-lower-case"),
        Arity::Exact(1),
        normalize_to_lower_case,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regexp_match() {
        let args = ["^admin-.*$".to_string(), "admin-alice".to_string()];
        assert_eq!(regexp_match(&args), Ok(true));
        let args = ["^admin-.*$".to_string(), "guest-bob".to_string()];
        assert_eq!(regexp_match(&args), Ok(false));
    }

    #[test]
    fn test_regex_cache_reuses_compiled_pattern() {
        let cache = RegexCache::new(4);
        assert!(cache.compiled("^a+$").unwrap().is_match("aaa"));
        assert!(cache.contains("^a+$"));
        assert!(cache.compiled("^a+$").unwrap().is_match("a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_regex_cache_is_bounded() {
        let cache = RegexCache::new(8);
        for i in 0..32 {
            let pattern = format!("^bounded-{}$", i);
            assert!(cache.compiled(&pattern).unwrap().is_match(&format!("bounded-{}", i)));
        }
        assert_eq!(cache.len(), 8);
        assert!(!cache.contains("^bounded-0$"), "Oldest pattern must be evicted");
        assert!(cache.contains("^bounded-31$"));
    }

    #[test]
    fn test_regex_cache_keeps_recently_used() {
        let cache = RegexCache::new(2);
        cache.compiled("^a$").unwrap();
        cache.compiled("^b$").unwrap();
        cache.compiled("^a$").unwrap();
        cache.compiled("^c$").unwrap();
        assert!(cache.contains("^a$"));
        assert!(!cache.contains("^b$"));
    }

    #[test]
    fn test_regex_cache_clear() {
        let cache = RegexCache::new(4);
        cache.compiled("^x$").unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalid_regexp() {
        let args = ["(".to_string(), "x".to_string()];
        assert!(regexp_match(&args).unwrap_err().starts_with("Invalid regular expression"));
    }

    #[test]
    fn test_substring_argument_order() {
        let args = ["doc".to_string(), "document".to_string()];
        assert_eq!(starts_with(&args), Ok(true));
        assert_eq!(contains(&args), Ok(true));
        assert_eq!(ends_with(&args), Ok(false));
    }
}
