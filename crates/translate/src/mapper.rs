//! Model-name rewriting through ordered substring rules.

use indexmap::IndexMap;

/// Rewrites requested model identifiers using an ordered list of
/// substring rules.
///
/// Identifiers that already contain a `/` namespace separator are treated
/// as fully qualified and pass through unchanged. Otherwise the first rule
/// (in configuration order) whose key appears as a substring of the
/// identifier wins; when no rule matches, the identifier is returned as-is.
#[derive(Debug, Clone, Default)]
pub struct ModelMapper {
    rules: IndexMap<String, String>,
}

impl ModelMapper {
    /// A mapper applying the given rules in their iteration order.
    pub fn new(rules: IndexMap<String, String>) -> Self {
        Self { rules }
    }

    /// Map a requested model identifier. Total: never fails.
    pub fn map(&self, model: &str) -> String {
        if model.contains('/') {
            return model.to_string();
        }

        for (keyword, target) in &self.rules {
            if model.contains(keyword.as_str()) {
                return target.clone();
            }
        }

        model.to_string()
    }
}
