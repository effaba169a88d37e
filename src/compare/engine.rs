//! Comparison Engine
//!
//! Runs the three base passes (passive, skills, equipment) and then the
//! configured analyzer stages over a player and a target build.

use std::collections::HashSet;

use super::stages::{main_link_shortfall, StageContext};
use super::{
    gem_differences_by_slot, ComparisonDifference, ComparisonReport, ComparisonSummary,
    DifferenceBuffer, DifferenceCategory, Priority,
};
use crate::config::EngineConfig;
use crate::error::{BuildError, Result};
use crate::model::{Rarity, StandardizedCharacter};
use crate::reference::ReferenceData;

/// Compares two standardized characters
pub struct ComparisonEngine<'a> {
    reference: &'a ReferenceData,
    config: EngineConfig,
}

impl<'a> ComparisonEngine<'a> {
    pub fn new(reference: &'a ReferenceData, config: EngineConfig) -> Self {
        Self { reference, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compare `player` against `target`
    ///
    /// Fails only when either model breaks its invariants.
    pub fn compare(
        &self,
        player: &StandardizedCharacter,
        target: &StandardizedCharacter,
    ) -> Result<ComparisonReport> {
        player
            .validate()
            .map_err(|e| BuildError::InvalidModel(format!("player build: {}", e)))?;
        target
            .validate()
            .map_err(|e| BuildError::InvalidModel(format!("target build: {}", e)))?;

        tracing::info!(
            "Comparing {} (level {}) against {} (level {})",
            player.character_core.character_class,
            player.character_core.level,
            target.character_core.character_class,
            target.character_core.level
        );

        let ctx = StageContext {
            player,
            target,
            reference: self.reference,
            config: &self.config,
        };
        let mut buffer = DifferenceBuffer::new();

        compare_passives(&ctx, &mut buffer);
        tracing::debug!("Passive pass: {} differences", buffer.len());
        compare_skills(&ctx, &mut buffer);
        tracing::debug!("Skill pass: {} differences", buffer.len());
        compare_equipment(&ctx, &mut buffer);
        tracing::debug!("Equipment pass: {} differences", buffer.len());

        for stage in &self.config.stages {
            stage.run(&ctx, &mut buffer);
        }

        let differences = buffer.into_sorted();
        let summary = ComparisonSummary::from_differences(&differences);
        tracing::info!(
            "Comparison complete: {} differences ({} critical)",
            summary.total,
            summary.critical
        );

        Ok(ComparisonReport {
            differences,
            gem_differences_by_slot: gem_differences_by_slot(player, target),
            summary,
        })
    }
}

// =============================================================================
// Passive Pass
// =============================================================================

fn compare_passives(ctx: &StageContext<'_>, buffer: &mut DifferenceBuffer) {
    let player = &ctx.player.passive_allocation;
    let target = &ctx.target.passive_allocation;
    let allocated = player.allocated_set();
    let node_name = |id: u32| match &ctx.reference.skill_graph {
        Some(graph) => graph.node_name(id),
        None => format!("Node {}", id),
    };

    for (ids, category, priority, kind) in [
        (&target.keystone_nodes, DifferenceCategory::PassiveKeystone, Priority::Critical, "keystone"),
        (&target.notable_nodes, DifferenceCategory::PassiveNotable, Priority::High, "notable"),
    ] {
        for &id in ids.iter().filter(|id| !allocated.contains(*id)) {
            let name = node_name(id);
            buffer.push(
                ComparisonDifference::new(category, priority, id.to_string(), format!("Missing {}: {}", kind, name))
                    .values(None, Some(id.into()))
                    .action(
                        format!("Allocate {}", name),
                        format!("Find {} in the passive tree and allocate it", name),
                    ),
            );
        }
    }

    let (have, want) = (player.total_points_used(), target.total_points_used());
    if want > have {
        buffer.push(
            ComparisonDifference::new(
                DifferenceCategory::PassivePoints,
                Priority::Medium,
                "points",
                format!("Allocated passive points behind: {} -> {}", have, want),
            )
            .values(Some(have.into()), Some(want.into()))
            .action(
                format!("Gain {} more passive points", want - have),
                "Level up and finish the passive point quests",
            ),
        );
    }

    let player_core = &ctx.player.character_core;
    let target_core = &ctx.target.character_core;
    if target_core.ascendancy_status > player_core.ascendancy_status {
        buffer.push(
            ComparisonDifference::new(
                DifferenceCategory::Ascendancy,
                Priority::High,
                "ascendancy",
                format!(
                    "Ascendancy behind: {} ({} points) -> {} ({} points)",
                    player_core.ascendancy_status,
                    player_core.ascendancy_points,
                    target_core.ascendancy_status,
                    target_core.ascendancy_points
                ),
            )
            .values(
                Some(player_core.ascendancy_points.into()),
                Some(target_core.ascendancy_points.into()),
            )
            .action(
                "Complete the next Labyrinth",
                "Allocate the new ascendancy points in the ascendancy tree",
            ),
        );
    }

    for socket in target.allocated_sockets().filter(|s| !allocated.contains(&s.node_id)) {
        let message = match &socket.jewel {
            Some(jewel) => format!("Jewel socket {} not allocated (target uses {})", socket.node_id, jewel.name),
            None => format!("Jewel socket {} not allocated", socket.node_id),
        };
        buffer.push(
            ComparisonDifference::new(
                DifferenceCategory::JewelSocket,
                Priority::Low,
                socket.node_id.to_string(),
                message,
            )
            .values(None, Some(socket.node_id.into()))
            .action(
                "Path to the jewel socket",
                format!("Allocate socket {} and place a jewel in it", socket.node_id),
            ),
        );
    }
}

// =============================================================================
// Skill Pass
// =============================================================================

fn compare_skills(ctx: &StageContext<'_>, buffer: &mut DifferenceBuffer) {
    let Some(target_main) = ctx.target.skill_setup.main_skill_group() else {
        return;
    };
    let Some(player_main) = ctx.player.skill_setup.main_skill_group() else {
        buffer.push(
            ComparisonDifference::new(
                DifferenceCategory::MainSkill,
                Priority::Critical,
                "main_group",
                "No main skill group (an active skill with four or more links)",
            )
            .values(None, target_main.main_skill.as_deref().map(Into::into))
            .action(
                "Set up the main skill in a linked item",
                format!("Create a socket group in {} with the main skill and its supports", target_main.slot),
            ),
        );
        return;
    };

    if player_main.main_skill != target_main.main_skill {
        let current = player_main.main_skill.as_deref().unwrap_or("none");
        let wanted = target_main.main_skill.as_deref().unwrap_or("none");
        buffer.push(
            ComparisonDifference::new(
                DifferenceCategory::MainSkill,
                Priority::Critical,
                "main_skill",
                format!("Different main skill: {} -> {}", current, wanted),
            )
            .values(Some(current.into()), Some(wanted.into()))
            .action(
                format!("Switch the main skill to {}", wanted),
                format!("Replace {} with {} in the main socket group", current, wanted),
            ),
        );
    }

    let player_supports: HashSet<&str> = player_main.support_gems.iter().map(String::as_str).collect();
    for support in target_main
        .support_gems
        .iter()
        .filter(|s| !player_supports.contains(s.as_str()))
    {
        buffer.push(
            ComparisonDifference::new(
                DifferenceCategory::GemMissing,
                Priority::High,
                support.as_str(),
                format!("Missing support gem: {}", support),
            )
            .values(None, Some(support.as_str().into()))
            .action(
                format!("Add {} to the main skill", support),
                format!("Socket {} into the main group", support),
            ),
        );
    }

    for target_gem in &target_main.gems {
        let Some(player_gem) = player_main.gem(&target_gem.name) else {
            continue;
        };
        if target_gem.level > player_gem.level {
            buffer.push(
                ComparisonDifference::new(
                    DifferenceCategory::GemLevel,
                    Priority::Medium,
                    target_gem.name.as_str(),
                    format!("{} level: {} -> {}", target_gem.name, player_gem.level, target_gem.level),
                )
                .values(Some(player_gem.level.into()), Some(target_gem.level.into()))
                .action(
                    format!("Level {} to {}", target_gem.name, target_gem.level),
                    "Keep the gem socketed or use a Gemcutter's Prism and corruption for the last levels",
                ),
            );
        }
        if target_gem.quality > player_gem.quality {
            buffer.push(
                ComparisonDifference::new(
                    DifferenceCategory::GemQuality,
                    Priority::Low,
                    target_gem.name.as_str(),
                    format!("{} quality: {}% -> {}%", target_gem.name, player_gem.quality, target_gem.quality),
                )
                .values(Some(player_gem.quality.into()), Some(target_gem.quality.into()))
                .action(
                    format!("Raise {} quality to {}%", target_gem.name, target_gem.quality),
                    "Apply Gemcutter's Prisms",
                ),
            );
        }
    }
}

// =============================================================================
// Equipment Pass
// =============================================================================

fn compare_equipment(ctx: &StageContext<'_>, buffer: &mut DifferenceBuffer) {
    let player = &ctx.player.equipment_snapshot;
    let target = &ctx.target.equipment_snapshot;
    let main_slot = ctx
        .target
        .skill_setup
        .main_skill_group()
        .and_then(|g| g.equipment_slot());

    for (&slot, target_item) in &target.items {
        let key = slot.key();
        let Some(player_item) = player.get(slot) else {
            buffer.push(
                ComparisonDifference::new(
                    DifferenceCategory::EquipmentMissing,
                    Priority::High,
                    key,
                    format!("Empty slot: {} (target uses {})", slot, target_item.name),
                )
                .values(None, Some(target_item.name.as_str().into()))
                .action(
                    format!("Equip a {}", target_item.base_type),
                    format!("Add an item to the {} slot", slot),
                )
                .slot(key),
            );
            continue;
        };

        if target_item.rarity == Rarity::Unique && player_item.name != target_item.name {
            buffer.push(
                ComparisonDifference::new(
                    DifferenceCategory::EquipmentUnique,
                    Priority::High,
                    key,
                    format!("Missing unique in {}: {}", slot, target_item.name),
                )
                .values(
                    Some(player_item.name.as_str().into()),
                    Some(target_item.name.as_str().into()),
                )
                .action(
                    format!("Get {}", target_item.name),
                    format!("Replace the {} item with {}", slot, target_item.name),
                )
                .slot(key),
            );
        }

        let (have, want) = (player_item.max_links(), target_item.max_links());
        if want > have && Some(slot) != main_slot {
            buffer.push(
                ComparisonDifference::new(
                    DifferenceCategory::SocketLinks,
                    Priority::Medium,
                    key,
                    format!("{} links: {}L -> {}L", slot, have, want),
                )
                .values(Some(have.into()), Some(want.into()))
                .action(
                    format!("Link {} sockets on the {}", want, slot),
                    "Use Orbs of Fusing or the crafting bench",
                )
                .slot(key),
            );
        }

        let have_influences = player_item.flags.influences();
        let missing: Vec<String> = target_item
            .flags
            .influences()
            .into_iter()
            .filter(|i| !have_influences.contains(i))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            buffer.push(
                ComparisonDifference::new(
                    DifferenceCategory::EquipmentInfluence,
                    Priority::Low,
                    key,
                    format!("{} lacks influence: {}", slot, missing.join(", ")),
                )
                .values(
                    Some(have_influences.iter().map(|i| i.to_string()).collect::<Vec<_>>().into()),
                    Some(missing.into()),
                )
                .action(
                    "Use an influenced base",
                    format!("Pick an influenced {} to unlock its modifiers", slot),
                )
                .slot(key),
            );
        }
    }

    if let Some(links) = main_link_shortfall(ctx.player, ctx.target, ctx.config.fallback_link_rarity) {
        buffer.push(links);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AscendancyStatus, CharacterCore, EquipmentItem, Gem, SkillGroup, SkillSetup, Slot,
    };

    fn character(groups: Vec<SkillGroup>) -> StandardizedCharacter {
        let mut character = StandardizedCharacter::new(CharacterCore::new(90, "Witch"));
        let main_group_index = groups.iter().position(SkillGroup::is_main_skill_group);
        character.skill_setup = SkillSetup {
            skill_groups: groups,
            main_group_index,
        };
        character
    }

    fn arc_group(supports: &[&str], level: u32) -> SkillGroup {
        let mut gems = vec![Gem::active("Arc").with_level(level)];
        gems.extend(supports.iter().map(|s| Gem::support(*s)));
        SkillGroup::new("Main", "Body Armour", true, gems)
    }

    fn base_engine(reference: &ReferenceData) -> ComparisonEngine<'_> {
        ComparisonEngine::new(reference, EngineConfig::without_stages())
    }

    #[test]
    fn test_identical_builds_have_no_differences() {
        let reference = ReferenceData::default();
        let build = character(vec![arc_group(
            &["Spell Echo Support", "Inspiration Support", "Trinity Support"],
            20,
        )]);
        let report = ComparisonEngine::new(&reference, EngineConfig::default())
            .compare(&build, &build.clone())
            .unwrap();
        assert!(report.differences.is_empty());
        assert_eq!(report.summary.total, 0);
        assert!(!report.has_critical());
    }

    #[test]
    fn test_skill_pass() {
        let reference = ReferenceData::default();
        let player = character(vec![arc_group(
            &["Spell Echo Support", "Elemental Focus Support", "Controlled Destruction Support"],
            18,
        )]);
        let target = character(vec![arc_group(
            &["Spell Echo Support", "Inspiration Support", "Trinity Support"],
            21,
        )]);

        let report = base_engine(&reference).compare(&player, &target).unwrap();
        let keys: Vec<(DifferenceCategory, &str)> = report
            .differences
            .iter()
            .map(|d| (d.category, d.subject.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (DifferenceCategory::GemMissing, "Inspiration Support"),
                (DifferenceCategory::GemMissing, "Trinity Support"),
                (DifferenceCategory::GemLevel, "Arc"),
            ]
        );
    }

    #[test]
    fn test_missing_main_group_is_critical() {
        let reference = ReferenceData::default();
        let player = character(vec![SkillGroup::new("Aura", "Helmet", true, vec![Gem::active("Wrath")])]);
        let target = character(vec![arc_group(
            &["Spell Echo Support", "Inspiration Support", "Trinity Support"],
            20,
        )]);

        let report = base_engine(&reference).compare(&player, &target).unwrap();
        let subjects: Vec<&str> = report.differences.iter().map(|d| d.subject.as_str()).collect();
        assert_eq!(subjects, vec!["main_group", "main_links"]);
        assert!(report.has_critical());
    }

    #[test]
    fn test_passive_and_ascendancy_pass() {
        let reference = ReferenceData::default();
        let mut player = character(Vec::new());
        player.passive_allocation.allocated_nodes = vec![1, 2];
        let mut target = character(Vec::new());
        target.passive_allocation.allocated_nodes = vec![1, 2, 4, 6, 60001];
        target.passive_allocation.keystone_nodes = vec![6];
        target.passive_allocation.notable_nodes = vec![4];
        target.character_core.ascendancy = Some("Elementalist".to_string());
        target.character_core.ascendancy_status = AscendancyStatus::Partial;
        target.character_core.ascendancy_points = 1;

        let report = base_engine(&reference).compare(&player, &target).unwrap();
        let categories: Vec<DifferenceCategory> = report.differences.iter().map(|d| d.category).collect();
        assert_eq!(
            categories,
            vec![
                DifferenceCategory::PassiveKeystone,
                DifferenceCategory::PassiveNotable,
                DifferenceCategory::Ascendancy,
                DifferenceCategory::PassivePoints,
            ]
        );
        assert_eq!(report.differences[0].message, "Missing keystone: Node 6");
    }

    #[test]
    fn test_equipment_pass() {
        let reference = ReferenceData::default();
        let mut player = character(Vec::new());
        let mut target = character(Vec::new());

        let mut helmet = EquipmentItem::new("Helmet", "Crown of Eyes", "Hubris Circlet", Rarity::Unique);
        helmet.flags.shaper = true;
        target.equipment_snapshot.items.insert(Slot::Helmet, helmet);
        target.equipment_snapshot.items.insert(
            Slot::Boots,
            EquipmentItem::new("Boots", "Gale Stride", "Sorcerer Boots", Rarity::Rare),
        );
        player.equipment_snapshot.items.insert(
            Slot::Helmet,
            EquipmentItem::new("Helmet", "Doom Crown", "Hubris Circlet", Rarity::Rare),
        );

        let report = base_engine(&reference).compare(&player, &target).unwrap();
        let keys: Vec<(DifferenceCategory, &str)> = report
            .differences
            .iter()
            .map(|d| (d.category, d.subject.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (DifferenceCategory::EquipmentUnique, "helmet"),
                (DifferenceCategory::EquipmentMissing, "boots"),
                (DifferenceCategory::EquipmentInfluence, "helmet"),
            ]
        );
    }

    #[test]
    fn test_invalid_model_rejected() {
        let reference = ReferenceData::default();
        let mut broken = character(Vec::new());
        broken.character_core.ascendancy_points = 9;
        let err = base_engine(&reference).compare(&broken, &character(Vec::new())).unwrap_err();
        assert!(matches!(err, BuildError::InvalidModel(_)));
    }

    #[test]
    fn test_main_links_not_duplicated_by_stage() {
        let reference = ReferenceData::default();
        let player = character(vec![arc_group(&["Spell Echo Support", "Inspiration Support", "Trinity Support"], 20)]);
        let target = character(vec![arc_group(
            &[
                "Spell Echo Support",
                "Inspiration Support",
                "Trinity Support",
                "Controlled Destruction Support",
                "Arcane Surge Support",
            ],
            20,
        )]);

        let report = ComparisonEngine::new(&reference, EngineConfig::default())
            .compare(&player, &target)
            .unwrap();
        let links: Vec<&ComparisonDifference> = report
            .differences
            .iter()
            .filter(|d| d.category == DifferenceCategory::SkillLinks)
            .collect();
        assert_eq!(links.len(), 1);
        assert_eq!(report.differences[0].subject, "main_links");
    }
}
