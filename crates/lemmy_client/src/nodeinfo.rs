//! Nodeinfo discovery document.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Software name a Lemmy instance reports.
pub const EXPECTED_SOFTWARE: &str = "lemmy";

/// Nodeinfo document as served at `/nodeinfo/2.0.json`.
///
/// Kept as the raw JSON so any shape an instance serves is accepted; the
/// accessors read what they need and yield `None` on anything unexpected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeInfo(Value);

impl NodeInfo {
    pub fn new(document: Value) -> Self {
        Self(document)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Top-level field lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn software_name(&self) -> Option<&str> {
        self.software_field("name")
    }

    pub fn software_version(&self) -> Option<&str> {
        self.software_field("version")
    }

    pub fn is_lemmy(&self) -> bool {
        self.software_name() == Some(EXPECTED_SOFTWARE)
    }

    fn software_field(&self, key: &str) -> Option<&str> {
        self.0.get("software")?.get(key)?.as_str()
    }
}

impl From<Value> for NodeInfo {
    fn from(document: Value) -> Self {
        Self(document)
    }
}
