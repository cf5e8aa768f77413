//! Configuration provider with dotted-path lookup.
//!
//! Test suites pull their timeout budgets from configuration rather than
//! hardcoding them per call site (`timeouts.find`, `timeouts.try`). Values
//! live in a JSON tree; `get("timeouts.find")` walks nested objects.

use crate::policy::{DEFAULT_FIND_TIMEOUT_MS, DEFAULT_RETRY_INTERVAL_MS, DEFAULT_RETRY_TIMEOUT_MS};
use crate::result::{EsperarError, EsperarResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Configuration provider backed by a JSON tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    root: Value,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: json!({
                "timeouts": {
                    "try": DEFAULT_RETRY_TIMEOUT_MS,
                    "find": DEFAULT_FIND_TIMEOUT_MS,
                    "wait_for": DEFAULT_RETRY_TIMEOUT_MS,
                    "poll_interval": DEFAULT_RETRY_INTERVAL_MS,
                }
            }),
        }
    }
}

impl Config {
    /// Create a config with the default timeout tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from an arbitrary JSON tree
    #[must_use]
    pub const fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Parse a config from a JSON string
    pub fn from_json(json: &str) -> EsperarResult<Self> {
        Ok(Self {
            root: serde_json::from_str(json)?,
        })
    }

    /// Look up a value by dotted path (e.g., `timeouts.find`)
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in key.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Look up a millisecond value by dotted path
    pub fn timeout_ms(&self, key: &str) -> EsperarResult<u64> {
        self.get(key)
            .and_then(Value::as_u64)
            .ok_or_else(|| EsperarError::MissingConfig {
                key: key.to_string(),
            })
    }

    /// Budget for element lookups (`timeouts.find`)
    #[must_use]
    pub fn find_timeout_ms(&self) -> u64 {
        self.timeout_ms("timeouts.find")
            .unwrap_or(DEFAULT_FIND_TIMEOUT_MS)
    }

    /// Default retry budget (`timeouts.try`)
    #[must_use]
    pub fn try_timeout_ms(&self) -> u64 {
        self.timeout_ms("timeouts.try")
            .unwrap_or(DEFAULT_RETRY_TIMEOUT_MS)
    }

    /// Delay between poll attempts (`timeouts.poll_interval`)
    #[must_use]
    pub fn poll_interval_ms(&self) -> u64 {
        self.timeout_ms("timeouts.poll_interval")
            .unwrap_or(DEFAULT_RETRY_INTERVAL_MS)
    }

    /// Override a value at a dotted path, creating intermediate objects
    pub fn set(&mut self, key: &str, value: Value) {
        let mut current = &mut self.root;
        let segments: Vec<&str> = key.split('.').collect();
        for segment in &segments[..segments.len() - 1] {
            if !current.is_object() {
                *current = json!({});
            }
            current = current
                .as_object_mut()
                .expect("just ensured object")
                .entry((*segment).to_string())
                .or_insert_with(|| json!({}));
        }
        if !current.is_object() {
            *current = json!({});
        }
        if let Some(last) = segments.last() {
            let _ = current
                .as_object_mut()
                .expect("just ensured object")
                .insert((*last).to_string(), value);
        }
    }
}
