//! Blackboard shared by the crew roles
//!
//! The `Context` struct is a key-value store that carries retrieved documents
//! and intermediate section outputs from one role to the next during a
//! newsletter run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Well-known context keys written during a newsletter run
pub mod keys {
    /// Identifier of the current run
    pub const RUN_ID: &str = "run_id";
    /// Date the newsletter is written for (YYYY-MM-DD)
    pub const AS_OF: &str = "as_of";
    /// Documents retrieved from the news collection
    pub const NEWS_DOCUMENTS: &str = "news_documents";
    /// Documents retrieved from the trends collection
    pub const TREND_DOCUMENTS: &str = "trend_documents";
    /// Output of the company analyst
    pub const COMPANY_INSIGHTS: &str = "company_insights";
    /// Output of the market trends analyst
    pub const MARKET_TRENDS: &str = "market_trends";
    /// Output of the risk manager
    pub const RISKS: &str = "risks";
    /// Output of the newsletter writer
    pub const NEWSLETTER: &str = "newsletter";
}

/// Context passed to roles during a run
///
/// # Example
///
/// ```
/// use letter_core::Context;
/// use letter_core::context::keys;
///
/// let mut ctx = Context::new().with_run_id("run-1");
/// ctx.set_text(keys::COMPANY_INSIGHTS, "Apple beat estimates.");
///
/// assert_eq!(ctx.run_id(), Some("run-1"));
/// assert_eq!(ctx.text(keys::COMPANY_INSIGHTS), Some("Apple beat estimates."));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the run identifier
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.set_text(keys::RUN_ID, run_id);
        self
    }

    /// Set the date the run is written for
    pub fn with_as_of(mut self, as_of: impl Into<String>) -> Self {
        self.set_text(keys::AS_OF, as_of);
        self
    }

    /// Get the run identifier
    pub fn run_id(&self) -> Option<&str> {
        self.text(keys::RUN_ID)
    }

    /// Get the as-of date
    pub fn as_of(&self) -> Option<&str> {
        self.text(keys::AS_OF)
    }

    /// Store a text entry
    pub fn set_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data
            .insert(key.into(), serde_json::Value::String(value.into()));
    }

    /// Get a text entry
    pub fn text(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(|v| v.as_str())
    }

    /// Get a text entry that an earlier role must have written
    pub fn require_text(&self, key: &str) -> crate::Result<&str> {
        self.text(key)
            .ok_or_else(|| crate::Error::MissingContext(key.to_string()))
    }

    /// Store a list of documents
    pub fn set_documents(&mut self, key: impl Into<String>, documents: &[String]) {
        self.data.insert(
            key.into(),
            serde_json::Value::Array(
                documents
                    .iter()
                    .map(|d| serde_json::Value::String(d.clone()))
                    .collect(),
            ),
        );
    }

    /// Get a list of documents; missing or non-list entries read as empty
    pub fn documents(&self, key: &str) -> Vec<String> {
        self.data
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Insert a raw value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a raw value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Insert a typed value into the context
    pub fn insert_typed<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> crate::Result<()> {
        let json_value = serde_json::to_value(value).map_err(|e| {
            crate::Error::ProcessingFailed(format!("Failed to serialize context value: {e}"))
        })?;
        self.data.insert(key.into(), json_value);
        Ok(())
    }

    /// Get a typed value from the context
    pub fn get_typed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> crate::Result<Option<T>> {
        match self.data.get(key) {
            None => Ok(None),
            Some(value) => {
                let typed = serde_json::from_value(value.clone()).map_err(|e| {
                    crate::Error::ProcessingFailed(format!(
                        "Failed to deserialize context value: {e}"
                    ))
                })?;
                Ok(Some(typed))
            }
        }
    }

    /// Check if a key exists in the context
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value from the context
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Section {
        title: String,
        words: usize,
    }

    #[test]
    fn test_text_entries() {
        let mut ctx = Context::new();
        assert!(ctx.is_empty());

        ctx.set_text(keys::RISKS, "Rates may rise");
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.text(keys::RISKS), Some("Rates may rise"));
        assert!(ctx.require_text(keys::RISKS).is_ok());

        ctx.remove(keys::RISKS);
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_require_missing_text() {
        let ctx = Context::new();
        let err = ctx.require_text(keys::MARKET_TRENDS).unwrap_err();
        assert!(matches!(err, crate::Error::MissingContext(k) if k == keys::MARKET_TRENDS));
    }

    #[test]
    fn test_documents_round_trip() {
        let mut ctx = Context::new();
        let docs = vec!["a".to_string(), "b".to_string()];
        ctx.set_documents(keys::NEWS_DOCUMENTS, &docs);

        assert_eq!(ctx.documents(keys::NEWS_DOCUMENTS), docs);
        assert!(ctx.documents(keys::TREND_DOCUMENTS).is_empty());
    }

    #[test]
    fn test_documents_of_text_entry_is_empty() {
        let mut ctx = Context::new();
        ctx.set_text(keys::NEWS_DOCUMENTS, "not a list");
        assert!(ctx.documents(keys::NEWS_DOCUMENTS).is_empty());
    }

    #[test]
    fn test_typed_insert_get() {
        let mut ctx = Context::new();
        let section = Section {
            title: "Risks".to_string(),
            words: 120,
        };

        ctx.insert_typed("section", &section).unwrap();

        let retrieved: Section = ctx.get_typed("section").unwrap().unwrap();
        assert_eq!(retrieved, section);
        assert!(ctx.get_typed::<Section>("missing").unwrap().is_none());
    }

    #[test]
    fn test_builder_chain() {
        let ctx = Context::new().with_run_id("run-7").with_as_of("2024-05-01");

        assert_eq!(ctx.run_id(), Some("run-7"));
        assert_eq!(ctx.as_of(), Some("2024-05-01"));
        assert!(ctx.contains_key(keys::AS_OF));
    }
}
