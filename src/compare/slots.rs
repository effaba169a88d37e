//! Per-slot gem breakdown

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{Gem, StandardizedCharacter};

/// Level or quality mismatch of a gem both sides socket in the same slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemLevelDifference {
    pub name: String,
    pub player_level: u32,
    pub target_level: u32,
    pub player_quality: u32,
    pub target_quality: u32,
}

/// Gem differences for one slot binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGemDifference {
    pub slot: String,
    pub player_gems: Vec<String>,
    pub target_gems: Vec<String>,
    /// Target gems the player does not socket here
    pub missing_gems: Vec<String>,
    /// Player gems the target does not socket here
    pub extra_gems: Vec<String>,
    pub level_differences: Vec<GemLevelDifference>,
    pub has_differences: bool,
}

/// Compare gems slot by slot
///
/// Groups sharing a slot binding are merged. Slots are listed in the order
/// the target uses them, followed by slots only the player uses.
pub fn gem_differences_by_slot(
    player: &StandardizedCharacter,
    target: &StandardizedCharacter,
) -> Vec<SlotGemDifference> {
    let player_slots = gems_by_slot(player);
    let target_slots = gems_by_slot(target);

    let mut order: Vec<&str> = target_slots.iter().map(|(slot, _)| *slot).collect();
    for (slot, _) in &player_slots {
        if !order.contains(slot) {
            order.push(*slot);
        }
    }

    order
        .into_iter()
        .map(|slot| compare_slot(slot, gems_in(&player_slots, slot), gems_in(&target_slots, slot)))
        .collect()
}

fn gems_by_slot(character: &StandardizedCharacter) -> Vec<(&str, Vec<&Gem>)> {
    let mut slots: Vec<(&str, Vec<&Gem>)> = Vec::new();
    for group in &character.skill_setup.skill_groups {
        let slot = group.slot.as_str();
        match slots.iter_mut().find(|(s, _)| *s == slot) {
            Some((_, gems)) => gems.extend(group.gems.iter()),
            None => slots.push((slot, group.gems.iter().collect())),
        }
    }
    slots
}

fn gems_in<'a, 'g>(slots: &'a [(&str, Vec<&'g Gem>)], slot: &str) -> &'a [&'g Gem] {
    slots
        .iter()
        .find(|(s, _)| *s == slot)
        .map(|(_, gems)| gems.as_slice())
        .unwrap_or(&[])
}

fn compare_slot(slot: &str, player: &[&Gem], target: &[&Gem]) -> SlotGemDifference {
    let player_names: HashSet<&str> = player.iter().map(|g| g.name.as_str()).collect();
    let target_names: HashSet<&str> = target.iter().map(|g| g.name.as_str()).collect();

    let missing_gems = dedup_names(
        target.iter().copied().filter(|g| !player_names.contains(g.name.as_str())),
    );
    let extra_gems = dedup_names(
        player.iter().copied().filter(|g| !target_names.contains(g.name.as_str())),
    );

    let mut level_differences = Vec::new();
    let mut seen = HashSet::new();
    for target_gem in target.iter().copied() {
        if !seen.insert(target_gem.name.as_str()) {
            continue;
        }
        let Some(player_gem) = player.iter().find(|g| g.name == target_gem.name) else {
            continue;
        };
        if player_gem.level != target_gem.level || player_gem.quality != target_gem.quality {
            level_differences.push(GemLevelDifference {
                name: target_gem.name.clone(),
                player_level: player_gem.level,
                target_level: target_gem.level,
                player_quality: player_gem.quality,
                target_quality: target_gem.quality,
            });
        }
    }

    let has_differences =
        !missing_gems.is_empty() || !extra_gems.is_empty() || !level_differences.is_empty();

    SlotGemDifference {
        slot: slot.to_string(),
        player_gems: player.iter().map(|g| g.name.clone()).collect(),
        target_gems: target.iter().map(|g| g.name.clone()).collect(),
        missing_gems,
        extra_gems,
        level_differences,
        has_differences,
    }
}

fn dedup_names<'g>(gems: impl Iterator<Item = &'g Gem>) -> Vec<String> {
    let mut seen = HashSet::new();
    gems.filter(|g| seen.insert(g.name.as_str()))
        .map(|g| g.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CharacterCore, SkillGroup, SkillSetup};

    fn character(groups: Vec<SkillGroup>) -> StandardizedCharacter {
        let mut character = StandardizedCharacter::new(CharacterCore::new(90, "Witch"));
        character.skill_setup = SkillSetup {
            skill_groups: groups,
            main_group_index: None,
        };
        character
    }

    #[test]
    fn test_slot_order_and_sets() {
        let player = character(vec![
            SkillGroup::new("Aura", "Helmet", true, vec![Gem::active("Wrath")]),
            SkillGroup::new(
                "Main",
                "Body Armour",
                true,
                vec![Gem::active("Arc").with_level(18), Gem::support("Elemental Focus Support")],
            ),
        ]);
        let target = character(vec![
            SkillGroup::new(
                "Main",
                "Body Armour",
                true,
                vec![Gem::active("Arc").with_level(21), Gem::support("Inspiration Support")],
            ),
            SkillGroup::new("Movement", "Boots", true, vec![Gem::active("Flame Dash")]),
        ]);

        let slots = gem_differences_by_slot(&player, &target);
        let order: Vec<&str> = slots.iter().map(|s| s.slot.as_str()).collect();
        assert_eq!(order, vec!["Body Armour", "Boots", "Helmet"]);

        let body = &slots[0];
        assert_eq!(body.missing_gems, vec!["Inspiration Support"]);
        assert_eq!(body.extra_gems, vec!["Elemental Focus Support"]);
        assert_eq!(body.level_differences.len(), 1);
        assert_eq!(body.level_differences[0].target_level, 21);
        assert!(body.has_differences);

        assert_eq!(slots[1].missing_gems, vec!["Flame Dash"]);
        assert!(slots[1].player_gems.is_empty());
        assert_eq!(slots[2].extra_gems, vec!["Wrath"]);
    }

    #[test]
    fn test_identical_slot_has_no_differences() {
        let build = character(vec![SkillGroup::new(
            "Main",
            "Gloves",
            true,
            vec![Gem::active("Arc"), Gem::support("Spell Echo Support")],
        )]);
        let slots = gem_differences_by_slot(&build, &build.clone());
        assert_eq!(slots.len(), 1);
        assert!(!slots[0].has_differences);
    }

    #[test]
    fn test_groups_sharing_a_slot_merge() {
        let player = character(vec![
            SkillGroup::new("A", "Unknown", true, vec![Gem::active("Arc")]),
            SkillGroup::new("B", "Unknown", true, vec![Gem::active("Frostbolt")]),
        ]);
        let slots = gem_differences_by_slot(&player, &character(Vec::new()));
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].extra_gems, vec!["Arc", "Frostbolt"]);
    }
}
