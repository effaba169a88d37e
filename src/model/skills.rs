//! Skill groups and gems

use serde::{Deserialize, Serialize};
use std::fmt;

use super::equipment::Slot;

/// Minimum links for a group to count as the main skill
pub const MAIN_SKILL_MIN_LINKS: usize = 4;

/// Alternate quality variant of a gem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QualityVariant {
    #[default]
    Default,
    Anomalous,
    Divergent,
    Phantasmal,
}

impl QualityVariant {
    /// Parse the exported quality identifier; unknown values map to `Default`
    pub fn from_quality_id(id: &str) -> Self {
        match id.trim() {
            "Alternate1" | "Anomalous" => Self::Anomalous,
            "Alternate2" | "Divergent" => Self::Divergent,
            "Alternate3" | "Phantasmal" => Self::Phantasmal,
            _ => Self::Default,
        }
    }
}

impl fmt::Display for QualityVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Anomalous => write!(f, "Anomalous"),
            Self::Divergent => write!(f, "Divergent"),
            Self::Phantasmal => write!(f, "Phantasmal"),
        }
    }
}

/// A socketed gem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gem {
    pub name: String,
    /// Gem level including item bonuses (1-50)
    pub level: u32,
    /// Gem quality including item bonuses (0-50)
    pub quality: u32,
    pub quality_variant: QualityVariant,
    pub is_support: bool,
    pub is_awakened: bool,
    pub is_vaal: bool,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_percent: Option<f64>,
}

impl Gem {
    /// Active gem at level 1, quality 0
    pub fn active(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            is_awakened: false,
            is_vaal: name.contains("Vaal"),
            name,
            level: 1,
            quality: 0,
            quality_variant: QualityVariant::Default,
            is_support: false,
            enabled: true,
            experience_percent: None,
        }
    }

    /// Support gem at level 1, quality 0
    pub fn support(name: impl Into<String>) -> Self {
        let mut gem = Self::active(name);
        gem.is_support = true;
        gem.is_awakened = gem.name.contains("Awakened");
        gem
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.clamp(1, 50);
        self
    }

    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality.min(50);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A socket group: gems linked together in one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub label: String,
    /// Slot binding as exported ("Body Armour", "Weapon 1", ...)
    pub slot: String,
    pub enabled: bool,
    pub gems: Vec<Gem>,
    /// Number of enabled gems
    pub link_count: usize,
    /// Active skill of the group, if any
    pub main_skill: Option<String>,
    pub support_gems: Vec<String>,
}

impl SkillGroup {
    /// Build a group and derive its link count, main skill and supports
    pub fn new(label: impl Into<String>, slot: impl Into<String>, enabled: bool, gems: Vec<Gem>) -> Self {
        let link_count = gems.iter().filter(|g| g.enabled).count();

        let mut main_skill = None;
        let mut support_gems = Vec::new();
        for gem in gems.iter().filter(|g| g.enabled) {
            if gem.is_support {
                support_gems.push(gem.name.clone());
            } else {
                main_skill = Some(gem.name.clone());
            }
        }

        Self {
            label: label.into(),
            slot: slot.into(),
            enabled,
            gems,
            link_count,
            main_skill,
            support_gems,
        }
    }

    /// Has an active skill and at least four links
    pub fn is_main_skill_group(&self) -> bool {
        self.main_skill.is_some() && self.link_count >= MAIN_SKILL_MIN_LINKS
    }

    /// Equipment slot this group is socketed in, if recognised
    pub fn equipment_slot(&self) -> Option<Slot> {
        Slot::parse(&self.slot)
    }

    pub fn gem(&self, name: &str) -> Option<&Gem> {
        self.gems.iter().find(|g| g.name == name)
    }
}

/// All skill groups of a build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillSetup {
    pub skill_groups: Vec<SkillGroup>,
    /// Index into `skill_groups` of the resolved main group
    pub main_group_index: Option<usize>,
}

impl SkillSetup {
    pub fn main_skill_group(&self) -> Option<&SkillGroup> {
        self.main_group_index.and_then(|i| self.skill_groups.get(i))
    }

    pub fn main_link_count(&self) -> usize {
        self.main_skill_group().map(|g| g.link_count).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_derivations() {
        let group = SkillGroup::new(
            "Main",
            "Body Armour",
            true,
            vec![
                Gem::active("Arc"),
                Gem::support("Spell Echo"),
                Gem::support("Controlled Destruction"),
                Gem::support("Lightning Penetration").disabled(),
                Gem::support("Inspiration"),
            ],
        );

        assert_eq!(group.link_count, 4);
        assert_eq!(group.main_skill.as_deref(), Some("Arc"));
        assert_eq!(group.support_gems.len(), 3);
        assert!(group.is_main_skill_group());
        assert_eq!(group.equipment_slot(), Some(Slot::BodyArmour));
    }

    #[test]
    fn test_small_group_not_main() {
        let group = SkillGroup::new("Aura", "Helmet", true, vec![Gem::active("Hatred"), Gem::support("Enlighten")]);
        assert!(!group.is_main_skill_group());
    }

    #[test]
    fn test_quality_variant_ids() {
        assert_eq!(QualityVariant::from_quality_id("Alternate2"), QualityVariant::Divergent);
        assert_eq!(QualityVariant::from_quality_id("Phantasmal"), QualityVariant::Phantasmal);
        assert_eq!(QualityVariant::from_quality_id("whatever"), QualityVariant::Default);
    }
}
