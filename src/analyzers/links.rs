//! Link Requirement Evaluation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::Rarity;

/// How hard a link target is to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDifficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
    ExtremelyHard,
    Impossible,
}

impl LinkDifficulty {
    /// Difficulty of reaching `target_links` on an item of `rarity`
    pub fn assess(target_links: usize, rarity: Rarity) -> Self {
        match target_links {
            0..=4 => LinkDifficulty::Easy,
            5 if rarity == Rarity::Rare => LinkDifficulty::Medium,
            5 => LinkDifficulty::Hard,
            6 if rarity == Rarity::Rare => LinkDifficulty::VeryHard,
            6 => LinkDifficulty::ExtremelyHard,
            _ => LinkDifficulty::Impossible,
        }
    }
}

impl fmt::Display for LinkDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkDifficulty::Easy => "easy",
            LinkDifficulty::Medium => "medium",
            LinkDifficulty::Hard => "hard",
            LinkDifficulty::VeryHard => "very_hard",
            LinkDifficulty::ExtremelyHard => "extremely_hard",
            LinkDifficulty::Impossible => "impossible",
        };
        write!(f, "{}", s)
    }
}

/// Rough currency estimate for linking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCost {
    pub fusings: u32,
    pub jewellers: u32,
}

impl LinkCost {
    pub fn for_links(target_links: usize) -> Self {
        let (fusings, jewellers) = match target_links {
            4 => (10, 20),
            5 => (150, 50),
            6 => (1500, 100),
            _ => (0, 0),
        };
        Self { fusings, jewellers }
    }
}

/// Result of [`evaluate_link_requirement`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEvaluation {
    pub satisfied: bool,
    pub current_links: usize,
    pub target_links: usize,
    pub link_gap: usize,
    /// Unset when the requirement is already met
    pub difficulty: Option<LinkDifficulty>,
    pub estimated_cost: Option<LinkCost>,
    pub recommendations: Vec<String>,
}

pub fn evaluate_link_requirement(current: usize, target: usize, rarity: Rarity) -> LinkEvaluation {
    if current >= target {
        return LinkEvaluation {
            satisfied: true,
            current_links: current,
            target_links: target,
            link_gap: 0,
            difficulty: None,
            estimated_cost: None,
            recommendations: Vec::new(),
        };
    }

    let difficulty = LinkDifficulty::assess(target, rarity);
    let mut recommendations = Vec::new();

    if target == 6 && current < 4 {
        recommendations.push(
            "Use a Tabula Rasa (six white linked sockets) as a bridge item".to_string(),
        );
    }
    if matches!(difficulty, LinkDifficulty::VeryHard | LinkDifficulty::ExtremelyHard) {
        recommendations.push(
            "Consider buying a pre-linked base or forcing the links at the crafting bench (1500 Orbs of Fusing)"
                .to_string(),
        );
    }
    recommendations.push(format!(
        "Use Orbs of Fusing and Jeweller's Orbs to reach {} links",
        target
    ));

    LinkEvaluation {
        satisfied: false,
        current_links: current,
        target_links: target,
        link_gap: target - current,
        difficulty: Some(difficulty),
        estimated_cost: Some(LinkCost::for_links(target)),
        recommendations,
    }
}
