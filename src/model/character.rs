//! Core character information

use serde::{Deserialize, Serialize};
use std::fmt;

/// Passive points granted by quests on top of levelling
pub const QUEST_PASSIVE_POINTS: u32 = 22;

/// Ascendancy points available to a fully ascended character
pub const MAX_ASCENDANCY_POINTS: u32 = 8;

/// How far the character has progressed through its ascendancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AscendancyStatus {
    #[default]
    None,
    Partial,
    Complete,
}

impl AscendancyStatus {
    /// Status implied by a count of allocated ascendancy nodes
    pub fn from_node_count(count: usize) -> Self {
        match count {
            0 => Self::None,
            n if n < MAX_ASCENDANCY_POINTS as usize => Self::Partial,
            _ => Self::Complete,
        }
    }

    /// Whether a point count is consistent with this status
    pub fn accepts_points(&self, points: u32) -> bool {
        match self {
            Self::None => points == 0,
            Self::Partial => (1..MAX_ASCENDANCY_POINTS).contains(&points),
            Self::Complete => points == MAX_ASCENDANCY_POINTS,
        }
    }
}

impl fmt::Display for AscendancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Partial => write!(f, "partial"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Level, class and ascendancy of a character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterCore {
    /// Character level (1-100)
    pub level: u32,
    /// Base class name
    pub character_class: String,
    /// Ascendancy class name, if chosen
    pub ascendancy: Option<String>,
    /// Derived from the allocated ascendancy node count
    pub ascendancy_status: AscendancyStatus,
    /// Allocated ascendancy points (0-8)
    pub ascendancy_points: u32,
    /// League label
    pub league: String,
}

impl CharacterCore {
    pub fn new(level: u32, character_class: impl Into<String>) -> Self {
        Self {
            level: level.clamp(1, 100),
            character_class: character_class.into(),
            ascendancy: None,
            ascendancy_status: AscendancyStatus::None,
            ascendancy_points: 0,
            league: "Standard".to_string(),
        }
    }

    /// Passive points from levelling alone
    pub fn available_passive_points(&self) -> u32 {
        self.level.saturating_sub(1)
    }

    /// Passive points including quest rewards
    pub fn total_available_points(&self) -> u32 {
        self.available_passive_points() + QUEST_PASSIVE_POINTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_buckets() {
        assert_eq!(AscendancyStatus::from_node_count(0), AscendancyStatus::None);
        for n in 1..=7 {
            assert_eq!(AscendancyStatus::from_node_count(n), AscendancyStatus::Partial);
        }
        assert_eq!(AscendancyStatus::from_node_count(8), AscendancyStatus::Complete);
    }

    #[test]
    fn test_points_consistency() {
        assert!(AscendancyStatus::None.accepts_points(0));
        assert!(!AscendancyStatus::Partial.accepts_points(8));
        assert!(AscendancyStatus::Complete.accepts_points(8));
    }

    #[test]
    fn test_passive_points() {
        let core = CharacterCore::new(90, "Witch");
        assert_eq!(core.available_passive_points(), 89);
        assert_eq!(core.total_available_points(), 111);
    }
}
