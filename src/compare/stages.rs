//! Analyzer Stages
//!
//! Optional deep-analysis passes run after the base passes. Each stage reads
//! both characters and appends to the shared buffer; a stage that lacks its
//! inputs (no skill graph, no main group, empty slot) contributes nothing.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::{ComparisonDifference, DifferenceBuffer, DifferenceCategory, DifferenceDetails, Priority};
use crate::analyzers::{
    analyze_gem_combination, analyze_mod_gap, compare_equipment_base, evaluate_link_requirement,
    ActiveGemDifferenceKind,
};
use crate::config::EngineConfig;
use crate::model::{Rarity, Slot, StandardizedCharacter};
use crate::reference::ReferenceData;
use crate::tree::{PathFinder, SuggestionCategory};

/// A configurable deep-analysis pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerStage {
    /// Path suggestions towards missing keystones and notables
    PassivePaths,
    /// Base and modifier comparison of the core slots
    EquipmentDepth,
    /// Support multiplier, awakened upgrades and links of the main group
    GemDepth,
}

impl AnalyzerStage {
    pub const ALL: [AnalyzerStage; 3] = [
        AnalyzerStage::PassivePaths,
        AnalyzerStage::EquipmentDepth,
        AnalyzerStage::GemDepth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerStage::PassivePaths => "passive_paths",
            AnalyzerStage::EquipmentDepth => "equipment_depth",
            AnalyzerStage::GemDepth => "gem_depth",
        }
    }

    pub(crate) fn run(&self, ctx: &StageContext<'_>, buffer: &mut DifferenceBuffer) {
        let before = buffer.len();
        match self {
            AnalyzerStage::PassivePaths => passive_paths(ctx, buffer),
            AnalyzerStage::EquipmentDepth => equipment_depth(ctx, buffer),
            AnalyzerStage::GemDepth => gem_depth(ctx, buffer),
        }
        tracing::debug!("Stage {} added {} differences", self, buffer.len() - before);
    }
}

impl fmt::Display for AnalyzerStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inputs shared by every pass of one comparison
pub(crate) struct StageContext<'a> {
    pub player: &'a StandardizedCharacter,
    pub target: &'a StandardizedCharacter,
    pub reference: &'a ReferenceData,
    pub config: &'a EngineConfig,
}

// =============================================================================
// passive_paths
// =============================================================================

fn passive_paths(ctx: &StageContext<'_>, buffer: &mut DifferenceBuffer) {
    let Some(graph) = ctx.reference.skill_graph.as_ref() else {
        tracing::debug!("Skipping passive_paths: no skill graph loaded");
        return;
    };

    let player_nodes = ctx.player.passive_allocation.allocated_set();
    let player_buckets = graph.classify_nodes(&ctx.player.passive_allocation.allocated_nodes);
    let target_buckets = graph.classify_nodes(&ctx.target.passive_allocation.allocated_nodes);

    let missing = |target: &[u32], player: &[u32]| -> Vec<u32> {
        let have: HashSet<&u32> = player.iter().collect();
        target.iter().filter(|id| !have.contains(id)).copied().collect()
    };
    let missing_keystones = missing(&target_buckets.keystone, &player_buckets.keystone);
    let missing_notables = missing(&target_buckets.notable, &player_buckets.notable);

    if missing_keystones.is_empty() && missing_notables.is_empty() {
        return;
    }

    let suggestions = PathFinder::new(graph).suggest_optimal_paths(
        &player_nodes,
        &missing_keystones,
        &missing_notables,
        ctx.config.max_path_suggestions,
    );

    for suggestion in suggestions {
        let category = match suggestion.category {
            SuggestionCategory::Keystone => DifferenceCategory::PassiveKeystone,
            SuggestionCategory::Notable => DifferenceCategory::PassiveNotable,
        };
        let name = &suggestion.target_node_name;

        buffer.push(
            ComparisonDifference::new(
                category,
                Priority::High,
                format!("path:{}", suggestion.target_node_id),
                format!("Allocate {}", name),
            )
            .values(None, Some(suggestion.target_node_id.into()))
            .action(
                format!("Invest {} passive points", suggestion.cost),
                format!(
                    "Allocate {} in the passive tree; the suggested path passes {} nodes",
                    name, suggestion.cost
                ),
            )
            .details(DifferenceDetails::Path {
                path_nodes: suggestion.path,
                efficiency: suggestion.efficiency,
                detour_count: suggestion.detour_count,
            }),
        );
    }
}

// =============================================================================
// equipment_depth
// =============================================================================

fn equipment_depth(ctx: &StageContext<'_>, buffer: &mut DifferenceBuffer) {
    for slot_name in &ctx.config.core_slots {
        let Some(slot) = Slot::parse(slot_name) else {
            tracing::warn!("Ignoring unknown core slot '{}'", slot_name);
            continue;
        };
        let (Some(player_item), Some(target_item)) = (
            ctx.player.equipment_snapshot.get(slot),
            ctx.target.equipment_snapshot.get(slot),
        ) else {
            continue;
        };
        let key = slot.key();

        let base = compare_equipment_base(player_item, target_item);
        for diff in base.differences {
            buffer.push(
                ComparisonDifference::new(
                    DifferenceCategory::EquipmentCore,
                    diff.severity,
                    format!("{}:{}", key, diff.kind.key()),
                    diff.message,
                )
                .values(Some(diff.current), Some(diff.target))
                .action(
                    format!("Improve the {} of {}", diff.kind, key),
                    format!("Adjust the {} item in the item editor", slot),
                )
                .slot(key)
                .details(DifferenceDetails::Impact { impact: diff.impact }),
            );
        }

        let mods = analyze_mod_gap(&player_item.core_mods(), &target_item.core_mods());
        if mods.missing_count > 0 {
            let shown: Vec<&str> = mods.missing_mods.iter().take(3).map(String::as_str).collect();
            buffer.push(
                ComparisonDifference::new(
                    DifferenceCategory::EquipmentMods,
                    Priority::Medium,
                    key,
                    format!("{} is missing {} key modifiers", key, mods.missing_count),
                )
                .values(None, Some(mods.missing_mods.clone().into()))
                .action(
                    format!("Add modifiers to {}: {}", key, shown.join(", ")),
                    format!("Add these modifiers to the {} item to preview the effect", slot),
                )
                .slot(key)
                .details(DifferenceDetails::Mods {
                    recommendations: mods.recommendations,
                }),
            );
        }
    }
}

// =============================================================================
// gem_depth
// =============================================================================

fn gem_depth(ctx: &StageContext<'_>, buffer: &mut DifferenceBuffer) {
    let (Some(player_main), Some(target_main)) = (
        ctx.player.skill_setup.main_skill_group(),
        ctx.target.skill_setup.main_skill_group(),
    ) else {
        tracing::debug!("Skipping gem_depth: main skill group missing on one side");
        return;
    };

    let analysis = analyze_gem_combination(&player_main.gems, &target_main.gems);

    let multiplier = analysis.multiplier_comparison;
    if multiplier.gap_percentage > ctx.config.multiplier_gap_threshold {
        buffer.push(
            ComparisonDifference::new(
                DifferenceCategory::GemMissing,
                Priority::High,
                "multiplier",
                format!("Support multiplier gap: {:.1}%", multiplier.gap_percentage),
            )
            .values(Some(multiplier.player.into()), Some(multiplier.target.into()))
            .action(
                "Rework the support gems to raise the multiplier",
                "Swap support gems in the main group and watch the DPS change",
            )
            .details(DifferenceDetails::Multiplier(multiplier)),
        );
    }

    for upgrade in &analysis.support_gem_analysis.awakened_upgrades {
        buffer.push(
            ComparisonDifference::new(
                DifferenceCategory::GemMissing,
                Priority::Medium,
                format!("awakened:{}", upgrade.current),
                format!("Awakened upgrade available: {}", upgrade.current),
            )
            .values(
                Some(upgrade.current.as_str().into()),
                Some(upgrade.upgrade_to.as_str().into()),
            )
            .action(
                format!("Replace {} with {}", upgrade.current, upgrade.upgrade_to),
                "Swap in the awakened version in the main group",
            )
            .details(DifferenceDetails::AwakenedUpgrade {
                expected_gain: format!("+{:.0}% multiplier", upgrade.multiplier_gain * 100.0),
            }),
        );
    }

    let variant = analysis
        .active_gem_analysis
        .differences
        .iter()
        .find(|d| d.kind == ActiveGemDifferenceKind::QualityVariant);
    if let (Some(variant), Some(skill)) = (variant, target_main.main_skill.as_deref()) {
        buffer.push(
            ComparisonDifference::new(
                DifferenceCategory::GemQuality,
                Priority::Low,
                format!("variant:{}", skill),
                format!("Quality variant differs: {} -> {}", variant.current, variant.target),
            )
            .values(Some(variant.current.clone()), Some(variant.target.clone()))
            .action(
                format!("Use the {} variant of {}", variant.target, skill),
                "Change the gem's quality variant in the skill editor",
            ),
        );
    }

    if let Some(links) = main_link_shortfall(ctx.player, ctx.target, ctx.config.fallback_link_rarity) {
        buffer.push(links);
    }
}

/// Critical difference when the player's main group has fewer links than the target's
///
/// Link difficulty uses the rarity of the player's item in the main group's
/// slot, or `fallback` when that item is unknown.
pub(crate) fn main_link_shortfall(
    player: &StandardizedCharacter,
    target: &StandardizedCharacter,
    fallback: Rarity,
) -> Option<ComparisonDifference> {
    let target_main = target.skill_setup.main_skill_group()?;
    let player_main = player.skill_setup.main_skill_group();

    let rarity = player_main
        .and_then(|g| g.equipment_slot())
        .and_then(|slot| player.equipment_snapshot.get(slot))
        .map(|item| item.rarity)
        .unwrap_or(fallback);

    let evaluation = evaluate_link_requirement(
        player.skill_setup.main_link_count(),
        target_main.link_count,
        rarity,
    );
    if evaluation.satisfied {
        return None;
    }

    Some(
        ComparisonDifference::new(
            DifferenceCategory::SkillLinks,
            Priority::Critical,
            "main_links",
            format!(
                "Main skill links short: {}L -> {}L",
                evaluation.current_links, evaluation.target_links
            ),
        )
        .values(
            Some(evaluation.current_links.into()),
            Some(evaluation.target_links.into()),
        )
        .action(
            format!("Get a {}-link item for the main skill", evaluation.target_links),
            "Make sure the main skill item has enough linked sockets",
        )
        .details(DifferenceDetails::Links(evaluation)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CharacterCore, EquipmentItem, Gem, ModifierKind, Modifier, SkillGroup, SkillSetup};

    fn character(groups: Vec<SkillGroup>) -> StandardizedCharacter {
        let mut character = StandardizedCharacter::new(CharacterCore::new(90, "Witch"));
        let main_group_index = groups.iter().position(SkillGroup::is_main_skill_group);
        character.skill_setup = SkillSetup {
            skill_groups: groups,
            main_group_index,
        };
        character
    }

    fn group(gems: Vec<Gem>) -> SkillGroup {
        SkillGroup::new("Main", "Body Armour", true, gems)
    }

    fn run(stage: AnalyzerStage, player: &StandardizedCharacter, target: &StandardizedCharacter) -> Vec<ComparisonDifference> {
        let reference = ReferenceData::default();
        let config = EngineConfig::default();
        let ctx = StageContext {
            player,
            target,
            reference: &reference,
            config: &config,
        };
        let mut buffer = DifferenceBuffer::new();
        stage.run(&ctx, &mut buffer);
        buffer.into_sorted()
    }

    #[test]
    fn test_stage_names() {
        let json = serde_json::to_string(&AnalyzerStage::ALL).unwrap();
        assert_eq!(json, r#"["passive_paths","equipment_depth","gem_depth"]"#);
    }

    #[test]
    fn test_passive_paths_without_graph() {
        let player = character(Vec::new());
        let mut target = character(Vec::new());
        target.passive_allocation.allocated_nodes = vec![4, 6];
        target.passive_allocation.keystone_nodes = vec![6];
        assert!(run(AnalyzerStage::PassivePaths, &player, &target).is_empty());
    }

    #[test]
    fn test_gem_depth_reports_links_multiplier_and_awakened() {
        let player = character(vec![group(vec![
            Gem::active("Frostbolt"),
            Gem::support("Added Cold Damage Support"),
            Gem::support("Elemental Focus Support"),
            Gem::support("Controlled Destruction Support"),
        ])]);
        let target = character(vec![group(vec![
            Gem::active("Frostbolt"),
            Gem::support("Awakened Added Cold Damage Support"),
            Gem::support("Added Cold Damage Support"),
            Gem::support("Hypothermia Support"),
            Gem::support("Inspiration Support"),
            Gem::support("Trinity Support"),
        ])]);

        let diffs = run(AnalyzerStage::GemDepth, &player, &target);
        let subjects: Vec<&str> = diffs.iter().map(|d| d.subject.as_str()).collect();
        assert_eq!(
            subjects,
            vec!["main_links", "multiplier", "awakened:Added Cold Damage Support"]
        );
        assert_eq!(diffs[0].priority, Priority::Critical);
        assert!(matches!(diffs[0].details, Some(DifferenceDetails::Links(_))));
        assert!(matches!(diffs[1].details, Some(DifferenceDetails::Multiplier(_))));
    }

    #[test]
    fn test_gem_depth_needs_both_main_groups() {
        let player = character(vec![group(vec![Gem::active("Arc")])]);
        let target = character(vec![group(vec![
            Gem::active("Arc"),
            Gem::support("Inspiration Support"),
            Gem::support("Trinity Support"),
            Gem::support("Spell Echo Support"),
        ])]);
        assert!(run(AnalyzerStage::GemDepth, &player, &target).is_empty());
    }

    #[test]
    fn test_link_rarity_falls_back() {
        let player = character(Vec::new());
        let target = character(vec![group(vec![
            Gem::active("Arc"),
            Gem::support("Inspiration Support"),
            Gem::support("Trinity Support"),
            Gem::support("Spell Echo Support"),
            Gem::support("Controlled Destruction Support"),
            Gem::support("Arcane Surge Support"),
        ])]);

        let diff = main_link_shortfall(&player, &target, Rarity::Rare).unwrap();
        match diff.details {
            Some(DifferenceDetails::Links(eval)) => {
                assert_eq!(eval.current_links, 0);
                assert_eq!(eval.target_links, 6);
                assert_eq!(eval.difficulty, Some(crate::analyzers::LinkDifficulty::VeryHard));
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_equipment_depth_core_slot() {
        let mut player = character(Vec::new());
        let mut target = character(Vec::new());

        let mut player_armour = EquipmentItem::new("Body Armour", "Doom Shell", "Astral Plate", Rarity::Rare);
        player_armour.item_level = 84;
        player_armour
            .explicit_mods
            .push(Modifier::new("+80 to maximum Life", ModifierKind::Explicit));
        let mut target_armour = EquipmentItem::new("Body Armour", "Storm Shell", "Vaal Regalia", Rarity::Rare);
        target_armour.item_level = 86;
        target_armour
            .explicit_mods
            .push(Modifier::new("+40% to Cold Resistance", ModifierKind::Explicit));

        player.equipment_snapshot.items.insert(Slot::BodyArmour, player_armour);
        target.equipment_snapshot.items.insert(Slot::BodyArmour, target_armour);

        let diffs = run(AnalyzerStage::EquipmentDepth, &player, &target);
        let subjects: Vec<&str> = diffs.iter().map(|d| d.subject.as_str()).collect();
        assert_eq!(
            subjects,
            vec!["body_armour:base_type", "body_armour:item_level", "body_armour"]
        );
        assert!(diffs.iter().all(|d| d.slot.as_deref() == Some("body_armour")));
        assert_eq!(diffs[2].category, DifferenceCategory::EquipmentMods);
    }
}
