//! Hierarchical content trees.

use nlsearch_core::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// A node of a content tree: named properties plus named children.
///
/// ```json
/// {
///   "properties": { "jcr:primaryType": "nt:unstructured" },
///   "children": {
///     "newnode": { "properties": { "jcr:description": "a repository is quite a thing" } }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    #[serde(default)]
    pub children: BTreeMap<String, ContentNode>,
}

impl ContentNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, name: impl Into<String>, child: ContentNode) -> Self {
        self.children.insert(name.into(), child);
        self
    }

    /// Parse a tree from JSON.
    pub fn from_json(source: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read a JSON tree from disk.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    /// Number of nodes in the tree, this one included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.values());
        }
        count
    }

    /// Property values as index field text. Nulls are skipped.
    #[must_use]
    pub fn fields(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .filter_map(|(name, value)| property_text(value).map(|text| (name.clone(), text)))
            .collect()
    }
}

/// Index text of a property value. Multi-valued properties are space-joined.
fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(values) => {
            let parts: Vec<String> = values.iter().filter_map(property_text).collect();
            Some(parts.join(" "))
        }
        Value::Object(_) => Some(value.to_string()),
    }
}
