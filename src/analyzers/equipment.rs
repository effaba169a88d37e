//! Equipment Analysis
//!
//! Base-level comparison of two items in the same slot and keyword-level
//! modifier gap detection.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use crate::compare::{DiffValue, Priority};
use crate::model::{EquipmentItem, ModTier, Modifier};

/// Item level from which a gap is treated as high severity
pub const HIGH_ITEM_LEVEL: u32 = 86;

/// Modifier keywords tracked for gap detection, in report order
pub const MOD_KEYWORDS: &[&str] = &[
    "Life",
    "Energy Shield",
    "Mana",
    "Resistance",
    "Elemental Resistance",
    "Chaos Resistance",
    "Increased Damage",
    "Added Physical Damage",
    "Added Cold Damage",
    "Added Fire Damage",
    "Added Lightning Damage",
    "Critical Strike",
    "Attack Speed",
    "Cast Speed",
    "+# to Level of",
];

// =============================================================================
// Base Comparison
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaseDifferenceKind {
    ItemLevel,
    BaseType,
    Quality,
}

impl BaseDifferenceKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::ItemLevel => "item_level",
            Self::BaseType => "base_type",
            Self::Quality => "quality",
        }
    }
}

impl fmt::Display for BaseDifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemLevel => write!(f, "item level"),
            Self::BaseType => write!(f, "base type"),
            Self::Quality => write!(f, "quality"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseDifference {
    pub kind: BaseDifferenceKind,
    pub severity: Priority,
    pub current: DiffValue,
    pub target: DiffValue,
    pub message: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseComparison {
    pub has_differences: bool,
    pub differences: Vec<BaseDifference>,
    /// 0-100
    pub compatibility_score: f64,
}

pub fn compare_equipment_base(player: &EquipmentItem, target: &EquipmentItem) -> BaseComparison {
    let mut differences = Vec::new();

    if player.item_level < target.item_level {
        differences.push(BaseDifference {
            kind: BaseDifferenceKind::ItemLevel,
            severity: if target.item_level >= HIGH_ITEM_LEVEL {
                Priority::High
            } else {
                Priority::Medium
            },
            current: player.item_level.into(),
            target: target.item_level.into(),
            message: format!("Item level too low: {} -> {}", player.item_level, target.item_level),
            impact: "Caps the highest modifier tiers that can roll".to_string(),
        });
    }

    if player.base_type != target.base_type {
        differences.push(BaseDifference {
            kind: BaseDifferenceKind::BaseType,
            severity: Priority::Critical,
            current: player.base_type.as_str().into(),
            target: target.base_type.as_str().into(),
            message: format!("Base type differs: {} -> {}", player.base_type, target.base_type),
            impact: "Base stats cannot be crafted onto a different base".to_string(),
        });
    }

    if player.quality < target.quality {
        differences.push(BaseDifference {
            kind: BaseDifferenceKind::Quality,
            severity: Priority::Low,
            current: player.quality.into(),
            target: target.quality.into(),
            message: format!("Quality too low: {}% -> {}%", player.quality, target.quality),
            impact: "Lowers defences or weapon damage".to_string(),
        });
    }

    BaseComparison {
        has_differences: !differences.is_empty(),
        differences,
        compatibility_score: base_compatibility(player, target),
    }
}

fn base_compatibility(player: &EquipmentItem, target: &EquipmentItem) -> f64 {
    let mut score = 100.0;

    if player.base_type != target.base_type {
        score -= 50.0;
    }

    let ilvl_gap = target.item_level.saturating_sub(player.item_level) as f64;
    score -= (ilvl_gap * 2.0).min(30.0);

    let quality_gap = target.quality.saturating_sub(player.quality) as f64;
    score -= (quality_gap * 0.5).min(10.0);

    score.max(0.0)
}

// =============================================================================
// Modifier Gap
// =============================================================================

/// Rough grouping of a modifier line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModCategory {
    Life,
    Resistance,
    Damage,
    Critical,
    Speed,
    Other,
}

impl ModCategory {
    pub fn of(text: &str) -> Self {
        if text.contains("Life") {
            ModCategory::Life
        } else if text.contains("Resistance") {
            ModCategory::Resistance
        } else if text.contains("Damage") || text.contains("Added") {
            ModCategory::Damage
        } else if text.contains("Critical") {
            ModCategory::Critical
        } else if text.contains("Speed") {
            ModCategory::Speed
        } else {
            ModCategory::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDifference {
    pub category: ModCategory,
    pub player_tier: ModTier,
    pub target_tier: ModTier,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModGapAnalysis {
    /// Keywords only the target has
    pub missing_mods: Vec<String>,
    pub missing_count: usize,
    /// Keywords only the player has
    pub conflicting_mods: Vec<String>,
    pub tier_differences: Vec<TierDifference>,
    pub recommendations: Vec<String>,
}

pub fn analyze_mod_gap(player_mods: &[Modifier], target_mods: &[Modifier]) -> ModGapAnalysis {
    let player_keywords = mod_keywords(player_mods);
    let target_keywords = mod_keywords(target_mods);

    let missing_mods: Vec<String> = target_keywords
        .iter()
        .filter(|k| !player_keywords.contains(k))
        .map(|k| k.to_string())
        .collect();
    let conflicting_mods: Vec<String> = player_keywords
        .iter()
        .filter(|k| !target_keywords.contains(k))
        .map(|k| k.to_string())
        .collect();

    let mut tier_differences = Vec::new();
    for target in target_mods {
        for player in player_mods {
            if mods_are_similar(&player.text, &target.text) && player.tier.rank() > target.tier.rank() {
                tier_differences.push(TierDifference {
                    category: ModCategory::of(&target.text),
                    player_tier: player.tier,
                    target_tier: target.tier,
                    message: format!("Lower modifier tier: {}", player.text),
                });
            }
        }
    }

    let mut recommendations = Vec::new();
    if !missing_mods.is_empty() {
        let shown: Vec<&str> = missing_mods.iter().take(3).map(String::as_str).collect();
        recommendations.push(format!("Add these modifiers: {}", shown.join(", ")));
    }
    if !tier_differences.is_empty() {
        recommendations.push(format!(
            "{} modifier tier(s) need upgrading",
            tier_differences.len()
        ));
    }

    ModGapAnalysis {
        missing_count: missing_mods.len(),
        missing_mods,
        conflicting_mods,
        tier_differences,
        recommendations,
    }
}

fn digits() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid pattern"))
}

fn capitalized_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("valid pattern"))
}

/// Vocabulary keywords present in any modifier, in vocabulary order
///
/// Numbers are folded to `#` so "+1 to Level of" matches "+# to Level of".
fn mod_keywords(mods: &[Modifier]) -> Vec<&'static str> {
    let texts: Vec<String> = mods
        .iter()
        .map(|m| digits().replace_all(&m.text, "#").to_lowercase())
        .collect();

    MOD_KEYWORDS
        .iter()
        .copied()
        .filter(|keyword| {
            let needle = keyword.to_lowercase();
            texts.iter().any(|t| t.contains(&needle))
        })
        .collect()
}

/// At least half of the capitalized words are shared (Jaccard >= 0.5)
pub fn mods_are_similar(a: &str, b: &str) -> bool {
    let words_a: HashSet<&str> = capitalized_word().find_iter(a).map(|m| m.as_str()).collect();
    let words_b: HashSet<&str> = capitalized_word().find_iter(b).map(|m| m.as_str()).collect();
    if words_a.is_empty() || words_b.is_empty() {
        return false;
    }
    let overlap = words_a.intersection(&words_b).count();
    let total = words_a.union(&words_b).count();
    overlap as f64 / total as f64 >= 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModifierKind, Rarity};

    fn item(base: &str, ilvl: u32, quality: u32) -> EquipmentItem {
        let mut item = EquipmentItem::new("Body Armour", "Test", base, Rarity::Rare);
        item.item_level = ilvl;
        item.quality = quality;
        item
    }

    fn explicit(text: &str, tier: ModTier) -> Modifier {
        Modifier::new(text, ModifierKind::Explicit).with_tier(tier)
    }

    #[test]
    fn test_identical_items() {
        let result = compare_equipment_base(&item("Vaal Regalia", 86, 20), &item("Vaal Regalia", 86, 20));
        assert!(!result.has_differences);
        assert_eq!(result.compatibility_score, 100.0);
    }

    #[test]
    fn test_base_mismatch_is_critical_and_capped() {
        let result = compare_equipment_base(&item("Astral Plate", 1, 0), &item("Vaal Regalia", 86, 20));
        let base = result
            .differences
            .iter()
            .find(|d| d.kind == BaseDifferenceKind::BaseType)
            .unwrap();
        assert_eq!(base.severity, Priority::Critical);
        // 100 - 50 - 30 - 10
        assert_eq!(result.compatibility_score, 10.0);

        let ilvl = &result.differences[0];
        assert_eq!(ilvl.kind, BaseDifferenceKind::ItemLevel);
        assert_eq!(ilvl.severity, Priority::High);
    }

    #[test]
    fn test_medium_item_level_gap() {
        let result = compare_equipment_base(&item("Vaal Regalia", 80, 20), &item("Vaal Regalia", 84, 20));
        assert_eq!(result.differences.len(), 1);
        assert_eq!(result.differences[0].severity, Priority::Medium);
        assert_eq!(result.compatibility_score, 92.0);
    }

    #[test]
    fn test_mod_gap_keywords() {
        let player = vec![
            explicit("+80 to maximum Life", ModTier::T2),
            explicit("10% increased Attack Speed", ModTier::T3),
        ];
        let target = vec![
            explicit("+90 to maximum Life", ModTier::T1),
            explicit("+45% to Cold Resistance", ModTier::T1),
            explicit("+1 to Level of all Cold Spell Skill Gems", ModTier::Unknown),
        ];
        let result = analyze_mod_gap(&player, &target);

        assert_eq!(result.missing_mods, vec!["Resistance", "+# to Level of"]);
        assert_eq!(result.missing_count, 2);
        assert_eq!(result.conflicting_mods, vec!["Attack Speed"]);
        assert_eq!(result.tier_differences.len(), 1);
        assert_eq!(result.tier_differences[0].category, ModCategory::Life);
        assert_eq!(result.recommendations.len(), 2);
    }

    #[test]
    fn test_similarity() {
        assert!(mods_are_similar("+80 to maximum Life", "+90 to maximum Life"));
        assert!(!mods_are_similar("+80 to maximum Life", "+40% to Fire Resistance"));
        assert!(!mods_are_similar("+80", "+90"));
    }

    #[test]
    fn test_empty_inputs() {
        let result = analyze_mod_gap(&[], &[]);
        assert_eq!(result, ModGapAnalysis::default());
    }
}
