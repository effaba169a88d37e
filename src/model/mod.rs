//! Canonical Build Model
//!
//! The normalized, read-only representation of one character build. A
//! [`StandardizedCharacter`] is produced once per input by the extractor and
//! never mutated afterwards; comparison works on two shared references.

pub mod character;
pub mod equipment;
pub mod passive;
pub mod skills;

pub use character::{AscendancyStatus, CharacterCore, MAX_ASCENDANCY_POINTS};
pub use equipment::{
    EquipmentItem, EquipmentSnapshot, ItemFlags, ModTier, Modifier, ModifierKind, Rarity, Slot,
    SocketColor, SocketGroup, ValueRange,
};
pub use passive::{JewelSocket, PassiveAllocation, SocketKind};
pub use skills::{Gem, QualityVariant, SkillGroup, SkillSetup, MAIN_SKILL_MIN_LINKS};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BuildError, Result};

/// Source tag stamped on every imported build
pub const IMPORT_SOURCE: &str = "build_import";

/// Which flavour of the build tool produced the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolVariant {
    #[default]
    Official,
    Community,
}

impl fmt::Display for ToolVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Official => write!(f, "official"),
            Self::Community => write!(f, "community"),
        }
    }
}

/// A fully normalized character build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedCharacter {
    pub character_core: CharacterCore,
    pub passive_allocation: PassiveAllocation,
    pub skill_setup: SkillSetup,
    pub equipment_snapshot: EquipmentSnapshot,

    /// Where the build came from
    pub source: String,
    /// Detected exporter flavour
    pub tool_variant: ToolVariant,
    pub import_timestamp: DateTime<Utc>,
}

impl StandardizedCharacter {
    /// Character with empty sub-models
    pub fn new(character_core: CharacterCore) -> Self {
        Self {
            character_core,
            passive_allocation: PassiveAllocation::default(),
            skill_setup: SkillSetup::default(),
            equipment_snapshot: EquipmentSnapshot::default(),
            source: IMPORT_SOURCE.to_string(),
            tool_variant: ToolVariant::Official,
            import_timestamp: Utc::now(),
        }
    }

    /// Check the model invariants
    ///
    /// Extraction always produces valid models; this guards hand-built or
    /// deserialized instances before they reach the comparison engine.
    pub fn validate(&self) -> Result<()> {
        let core = &self.character_core;

        if !(1..=100).contains(&core.level) {
            return Err(BuildError::InvalidModel(format!(
                "character level {} outside 1-100",
                core.level
            )));
        }

        if core.ascendancy_points > MAX_ASCENDANCY_POINTS {
            return Err(BuildError::InvalidModel(format!(
                "{} ascendancy points exceed the maximum of {}",
                core.ascendancy_points, MAX_ASCENDANCY_POINTS
            )));
        }

        if !core.ascendancy_status.accepts_points(core.ascendancy_points) {
            return Err(BuildError::InvalidModel(format!(
                "ascendancy status '{}' inconsistent with {} points",
                core.ascendancy_status, core.ascendancy_points
            )));
        }

        if !self.passive_allocation.subsets_consistent() {
            return Err(BuildError::InvalidModel(
                "keystone/notable nodes must be allocated".to_string(),
            ));
        }

        let setup = &self.skill_setup;
        if let Some(index) = setup.main_group_index {
            if index >= setup.skill_groups.len() {
                return Err(BuildError::InvalidModel(format!(
                    "main group index {} out of range",
                    index
                )));
            }
        }

        for gem in setup.skill_groups.iter().flat_map(|g| g.gems.iter()) {
            if !(1..=50).contains(&gem.level) || gem.quality > 50 {
                return Err(BuildError::InvalidModel(format!(
                    "gem '{}' has level {} / quality {}",
                    gem.name, gem.level, gem.quality
                )));
            }
        }

        Ok(())
    }
}
