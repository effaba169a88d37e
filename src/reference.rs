//! Reference Data
//!
//! Read-only lookup tables shared by extraction and comparison: the gem
//! table (support classification) and the passive skill graph. Built once by
//! the host and passed by reference; nothing here is global.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::Result;
use crate::tree::SkillGraph;

/// One gem table entry
#[derive(Debug, Clone, Deserialize)]
pub struct GemEntry {
    pub display_name: String,
    #[serde(default)]
    pub is_support: bool,
}

/// Gem metadata keyed by internal identifier
#[derive(Debug, Clone, Default)]
pub struct GemTable {
    entries: HashMap<String, GemEntry>,
    /// Lowercase display names of support gems, with and without " support"
    support_names: HashSet<String>,
    /// Lowercase display names of every known gem
    known_names: HashSet<String>,
}

impl GemTable {
    /// Parse `{ key: { display_name, is_support } }`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: HashMap<String, GemEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: HashMap<String, GemEntry>) -> Self {
        let mut support_names = HashSet::new();
        let mut known_names = HashSet::new();

        for entry in entries.values() {
            let lower = entry.display_name.trim().to_lowercase();
            if entry.is_support {
                if let Some(stripped) = lower.strip_suffix(" support") {
                    support_names.insert(stripped.to_string());
                }
                support_names.insert(lower.clone());
            }
            known_names.insert(lower);
        }

        tracing::debug!(
            "Gem table loaded: {} gems, {} support names",
            entries.len(),
            support_names.len()
        );

        Self {
            entries,
            support_names,
            known_names,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&GemEntry> {
        self.entries.get(key)
    }

    /// Support lookup by display name
    ///
    /// `Some(true/false)` when the table knows the gem, `None` otherwise.
    pub fn support_status(&self, display_name: &str) -> Option<bool> {
        let lower = display_name.trim().to_lowercase();
        let with_suffix = format!("{} support", lower);
        if self.support_names.contains(&lower) || self.support_names.contains(&with_suffix) {
            Some(true)
        } else if self.known_names.contains(&lower) {
            Some(false)
        } else {
            None
        }
    }
}

/// Immutable reference data for one host process
#[derive(Debug, Default)]
pub struct ReferenceData {
    pub gems: Option<GemTable>,
    pub skill_graph: Option<SkillGraph>,
}

impl ReferenceData {
    pub fn new(gems: Option<GemTable>, skill_graph: Option<SkillGraph>) -> Self {
        Self { gems, skill_graph }
    }

    /// Load both tables; a missing or unreadable file leaves that table empty
    pub fn load(gem_table: Option<&Path>, skill_tree: Option<&Path>) -> Self {
        let gems = gem_table.and_then(|path| {
            load_with(path, GemTable::from_json_str)
                .map_err(|e| tracing::warn!("Gem table unavailable ({}): {}", path.display(), e))
                .ok()
        });
        let skill_graph = skill_tree.and_then(|path| {
            load_with(path, SkillGraph::from_json_str)
                .map_err(|e| tracing::warn!("Skill tree unavailable ({}): {}", path.display(), e))
                .ok()
        });
        Self { gems, skill_graph }
    }

    /// Support classification
    ///
    /// A positive gem table hit decides; otherwise the internal identifier,
    /// then name keywords.
    pub fn is_support_gem(&self, display_name: &str, gem_id: Option<&str>) -> bool {
        if self.gems.as_ref().and_then(|t| t.support_status(display_name)) == Some(true) {
            return true;
        }
        if gem_id.map(|id| id.contains("SupportGem")).unwrap_or(false) {
            return true;
        }
        display_name.contains("Support") || display_name.contains("Awakened")
    }
}

fn load_with<T>(path: &Path, parse: impl Fn(&str) -> Result<T>) -> Result<T> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GEMS: &str = r#"{
        "Metadata/Items/Gems/SkillGemArc": { "display_name": "Arc", "is_support": false },
        "Metadata/Items/Gems/SupportGemSpellEcho": { "display_name": "Spell Echo Support", "is_support": true },
        "Metadata/Items/Gems/SupportGemInspiration": { "display_name": "Inspiration", "is_support": true }
    }"#;

    #[test]
    fn test_table_lookup_with_suffix() {
        let table = GemTable::from_json_str(GEMS).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.support_status("Spell Echo"), Some(true));
        assert_eq!(table.support_status("spell echo support"), Some(true));
        assert_eq!(table.support_status("Inspiration Support"), Some(true));
        assert_eq!(table.support_status("Arc"), Some(false));
        assert_eq!(table.support_status("Fireball"), None);
    }

    #[test]
    fn test_support_precedence() {
        let refs = ReferenceData::new(Some(GemTable::from_json_str(GEMS).unwrap()), None);
        assert!(refs.is_support_gem("Spell Echo", None));
        assert!(!refs.is_support_gem("Arc", Some("Metadata/Items/Gems/SkillGemArc")));
        assert!(refs.is_support_gem("Controlled Destruction", Some("Metadata/Items/Gems/SupportGemControlledDestruction")));
        assert!(refs.is_support_gem("Awakened Added Cold Damage", None));
        assert!(!refs.is_support_gem("Fireball", None));
    }

    #[test]
    fn test_table_negative_falls_through() {
        let refs = ReferenceData::new(Some(GemTable::from_json_str(GEMS).unwrap()), None);
        // Table says Arc is active, but the identifier and keywords still count
        assert!(refs.is_support_gem("Arc", Some("Metadata/Items/Gems/SupportGemArc")));
        assert!(!refs.is_support_gem("Arc", None));

        let table = r#"{ "Metadata/Items/Gems/SkillGemAwakenedX": { "display_name": "Awakened Fury", "is_support": false } }"#;
        let refs = ReferenceData::new(Some(GemTable::from_json_str(table).unwrap()), None);
        assert!(refs.is_support_gem("Awakened Fury", None));
    }

    #[test]
    fn test_missing_files_degrade() {
        let refs = ReferenceData::load(
            Some(Path::new("/nonexistent/gems.json")),
            Some(Path::new("/nonexistent/tree.json")),
        );
        assert!(refs.gems.is_none());
        assert!(refs.skill_graph.is_none());
    }
}
