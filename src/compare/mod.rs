//! Priority Comparison
//!
//! Result types and the [`ComparisonEngine`]. Differences are collected into
//! an append-only [`DifferenceBuffer`] by the base passes and the configured
//! analyzer stages, then ordered most important first.

pub mod engine;
pub mod slots;
pub mod stages;

pub use engine::ComparisonEngine;
pub use slots::{gem_differences_by_slot, GemLevelDifference, SlotGemDifference};
pub use stages::AnalyzerStage;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::analyzers::{LinkEvaluation, MultiplierComparison};

// =============================================================================
// Priority
// =============================================================================

/// How urgent a difference is; also used as analyzer severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Categories
// =============================================================================

/// What a difference is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceCategory {
    PassiveKeystone,
    PassiveNotable,
    PassivePoints,
    Ascendancy,
    JewelSocket,
    MainSkill,
    GemMissing,
    GemLevel,
    GemQuality,
    SkillLinks,
    EquipmentMissing,
    EquipmentUnique,
    EquipmentCore,
    EquipmentMods,
    EquipmentInfluence,
    SocketLinks,
}

impl DifferenceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PassiveKeystone => "passive_keystone",
            Self::PassiveNotable => "passive_notable",
            Self::PassivePoints => "passive_points",
            Self::Ascendancy => "ascendancy",
            Self::JewelSocket => "jewel_socket",
            Self::MainSkill => "main_skill",
            Self::GemMissing => "gem_missing",
            Self::GemLevel => "gem_level",
            Self::GemQuality => "gem_quality",
            Self::SkillLinks => "skill_links",
            Self::EquipmentMissing => "equipment_missing",
            Self::EquipmentUnique => "equipment_unique",
            Self::EquipmentCore => "equipment_core",
            Self::EquipmentMods => "equipment_mods",
            Self::EquipmentInfluence => "equipment_influence",
            Self::SocketLinks => "socket_links",
        }
    }
}

impl fmt::Display for DifferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Difference Records
// =============================================================================

/// A current or target value attached to a difference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiffValue {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
    Nodes(Vec<u32>),
}

impl From<u32> for DiffValue {
    fn from(v: u32) -> Self {
        DiffValue::Int(v as i64)
    }
}

impl From<usize> for DiffValue {
    fn from(v: usize) -> Self {
        DiffValue::Int(v as i64)
    }
}

impl From<f64> for DiffValue {
    fn from(v: f64) -> Self {
        DiffValue::Float(v)
    }
}

impl From<&str> for DiffValue {
    fn from(v: &str) -> Self {
        DiffValue::Text(v.to_string())
    }
}

impl From<String> for DiffValue {
    fn from(v: String) -> Self {
        DiffValue::Text(v)
    }
}

impl From<Vec<String>> for DiffValue {
    fn from(v: Vec<String>) -> Self {
        DiffValue::List(v)
    }
}

impl fmt::Display for DiffValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffValue::Int(v) => write!(f, "{}", v),
            DiffValue::Float(v) => write!(f, "{:.2}", v),
            DiffValue::Text(v) => write!(f, "{}", v),
            DiffValue::List(v) => write!(f, "{}", v.join(", ")),
            DiffValue::Nodes(v) => {
                let ids: Vec<String> = v.iter().map(u32::to_string).collect();
                write!(f, "[{}]", ids.join(", "))
            }
        }
    }
}

/// Category-specific extra data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DifferenceDetails {
    Path {
        path_nodes: Vec<u32>,
        efficiency: f64,
        detour_count: usize,
    },
    Multiplier(MultiplierComparison),
    Links(LinkEvaluation),
    Mods {
        recommendations: Vec<String>,
    },
    Impact {
        impact: String,
    },
    AwakenedUpgrade {
        expected_gain: String,
    },
}

/// One prioritized difference between player and target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonDifference {
    pub category: DifferenceCategory,
    pub priority: Priority,
    pub message: String,
    /// What the difference is about (node ID, gem name, slot key, ...)
    pub subject: String,
    pub current_value: Option<DiffValue>,
    pub target_value: Option<DiffValue>,
    /// Recommended action
    pub action: String,
    /// Where to make the change in the build tool
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<DifferenceDetails>,
}

impl ComparisonDifference {
    pub fn new(
        category: DifferenceCategory,
        priority: Priority,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            priority,
            message: message.into(),
            subject: subject.into(),
            current_value: None,
            target_value: None,
            action: String::new(),
            instruction: String::new(),
            slot: None,
            details: None,
        }
    }

    pub fn values(mut self, current: Option<DiffValue>, target: Option<DiffValue>) -> Self {
        self.current_value = current;
        self.target_value = target;
        self
    }

    pub fn action(mut self, action: impl Into<String>, instruction: impl Into<String>) -> Self {
        self.action = action.into();
        self.instruction = instruction.into();
        self
    }

    pub fn slot(mut self, slot: impl Into<String>) -> Self {
        self.slot = Some(slot.into());
        self
    }

    pub fn details(mut self, details: DifferenceDetails) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for ComparisonDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.priority, self.category, self.message)?;
        if !self.action.is_empty() {
            write!(f, "\n  -> {}", self.action)?;
        }
        Ok(())
    }
}

// =============================================================================
// Buffer
// =============================================================================

/// Append-only collection; a second difference with the same
/// (category, subject) is dropped
#[derive(Debug, Default)]
pub struct DifferenceBuffer {
    items: Vec<ComparisonDifference>,
    seen: HashSet<(DifferenceCategory, String)>,
}

impl DifferenceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the difference duplicates an earlier one
    pub fn push(&mut self, difference: ComparisonDifference) -> bool {
        let key = (difference.category, difference.subject.clone());
        if !self.seen.insert(key) {
            tracing::debug!(
                "Dropping duplicate {} difference for '{}'",
                difference.category,
                difference.subject
            );
            return false;
        }
        self.items.push(difference);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComparisonDifference> {
        self.items.iter()
    }

    /// Most important first; discovery order within a priority
    pub fn into_sorted(self) -> Vec<ComparisonDifference> {
        let mut items = self.items;
        items.sort_by(|a, b| b.priority.cmp(&a.priority));
        items
    }
}

// =============================================================================
// Report
// =============================================================================

/// Counts over the final difference list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub by_category: BTreeMap<String, usize>,
}

impl ComparisonSummary {
    pub fn from_differences(differences: &[ComparisonDifference]) -> Self {
        let mut summary = Self {
            total: differences.len(),
            ..Self::default()
        };
        for diff in differences {
            match diff.priority {
                Priority::Critical => summary.critical += 1,
                Priority::High => summary.high += 1,
                Priority::Medium => summary.medium += 1,
                Priority::Low => summary.low += 1,
            }
            *summary
                .by_category
                .entry(diff.category.as_str().to_string())
                .or_insert(0) += 1;
        }
        summary
    }
}

/// Full output of one comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub differences: Vec<ComparisonDifference>,
    pub gem_differences_by_slot: Vec<SlotGemDifference>,
    pub summary: ComparisonSummary,
}

impl ComparisonReport {
    pub fn has_critical(&self) -> bool {
        self.summary.critical > 0
    }

    pub fn by_priority(&self, priority: Priority) -> impl Iterator<Item = &ComparisonDifference> {
        self.differences.iter().filter(move |d| d.priority == priority)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diff(category: DifferenceCategory, priority: Priority, subject: &str) -> ComparisonDifference {
        ComparisonDifference::new(category, priority, subject, format!("{} {}", category, subject))
    }

    #[test]
    fn test_priority_order() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_buffer_dedup() {
        let mut buffer = DifferenceBuffer::new();
        assert!(buffer.push(diff(DifferenceCategory::SkillLinks, Priority::Critical, "main_links")));
        assert!(!buffer.push(diff(DifferenceCategory::SkillLinks, Priority::Critical, "main_links")));
        assert!(buffer.push(diff(DifferenceCategory::SocketLinks, Priority::Medium, "main_links")));
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_stable_priority_sort() {
        let mut buffer = DifferenceBuffer::new();
        buffer.push(diff(DifferenceCategory::GemQuality, Priority::Low, "a"));
        buffer.push(diff(DifferenceCategory::GemMissing, Priority::High, "b"));
        buffer.push(diff(DifferenceCategory::GemLevel, Priority::Medium, "c"));
        buffer.push(diff(DifferenceCategory::GemMissing, Priority::High, "d"));
        buffer.push(diff(DifferenceCategory::MainSkill, Priority::Critical, "e"));
        buffer.push(diff(DifferenceCategory::GemQuality, Priority::Low, "f"));

        let subjects: Vec<String> = buffer.into_sorted().into_iter().map(|d| d.subject).collect();
        assert_eq!(subjects, vec!["e", "b", "d", "c", "a", "f"]);
    }

    #[test]
    fn test_summary_counts() {
        let diffs = vec![
            diff(DifferenceCategory::GemMissing, Priority::High, "a"),
            diff(DifferenceCategory::GemMissing, Priority::High, "b"),
            diff(DifferenceCategory::PassivePoints, Priority::Medium, "points"),
        ];
        let summary = ComparisonSummary::from_differences(&diffs);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.high, 2);
        assert_eq!(summary.critical, 0);
        assert_eq!(summary.by_category.get("gem_missing"), Some(&2));
    }

    #[test]
    fn test_details_serialization_tag() {
        let details = DifferenceDetails::Path {
            path_nodes: vec![1, 2],
            efficiency: 25.5,
            detour_count: 1,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["kind"], "path");
        assert_eq!(json["path_nodes"][1], 2);
    }
}
