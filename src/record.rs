//! Raw Build Records
//!
//! The navigable tree handed over by the external decoder. Each record has a
//! tag, string attributes, optional text and ordered children, mirroring the
//! markup the build tool exports. The extractor never sees the markup itself.
//!
//! ```json
//! { "tag": "PathOfBuilding", "children": [
//!     { "tag": "Build", "attributes": { "level": "90", "className": "Witch" } }
//! ] }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One record in the decoded build tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordNode {
    /// Record name (e.g. "Build", "Skill", "Gem")
    pub tag: String,

    /// String attributes, exactly as exported
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    /// Inner text (item text blocks, tree URLs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Child records in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RecordNode>,
}

impl RecordNode {
    /// Create an empty record with the given tag
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder: add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder: set the inner text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: append a child record
    pub fn with_child(mut self, child: RecordNode) -> Self {
        self.children.push(child);
        self
    }

    /// Parse a record tree from its JSON form
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: &str) -> Option<&RecordNode> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All direct children with the given tag
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a RecordNode> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// First record with the given tag anywhere below this one (depth-first)
    pub fn descendant(&self, tag: &str) -> Option<&RecordNode> {
        for child in &self.children {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.descendant(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Raw attribute value
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// First present attribute among several candidate names
    pub fn attr_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.attr(k))
    }

    /// Attribute parsed as a number; absent or malformed values yield `None`
    pub fn attr_parsed<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.attr(key).and_then(|v| v.trim().parse().ok())
    }

    /// Attribute read as a boolean ("true"/"false"), falling back to `default`
    pub fn attr_bool(&self, key: &str, default: bool) -> bool {
        match self.attr(key).map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "true" => true,
            Some(v) if v == "false" => false,
            _ => default,
        }
    }

    /// Inner text, empty when absent
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}
