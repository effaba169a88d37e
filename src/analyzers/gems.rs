//! Gem Combination Analysis
//!
//! Compares the gems of two skill groups: the active gem, the support set
//! and a heuristic damage multiplier. The multiplier is a ranking signal,
//! not a damage calculation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::compare::{DiffValue, Priority};
use crate::model::Gem;

/// Multiplier gain assumed for swapping a support for its awakened version
pub const AWAKENED_MULTIPLIER_GAIN: f64 = 0.05;

const AWAKENED_PREFIX: &str = "Awakened ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierKind {
    /// Multiplies with everything else
    More,
    /// Adds to other increased modifiers
    Increased,
}

// =============================================================================
// Multiplier Table
// =============================================================================

const SUPPORT_MULTIPLIERS: &[(&str, MultiplierKind, f64)] = &[
    ("Awakened Added Cold Damage Support", MultiplierKind::More, 1.49),
    ("Added Cold Damage Support", MultiplierKind::More, 1.44),
    ("Elemental Damage with Attacks Support", MultiplierKind::More, 1.54),
    ("Awakened Elemental Damage with Attacks Support", MultiplierKind::More, 1.59),
    ("Vicious Projectiles Support", MultiplierKind::More, 1.49),
    ("Hypothermia Support", MultiplierKind::More, 1.39),
    ("Inspiration Support", MultiplierKind::More, 1.39),
    ("Trinity Support", MultiplierKind::More, 1.49),
    ("Multistrike Support", MultiplierKind::More, 1.44),
    ("Melee Physical Damage Support", MultiplierKind::More, 1.49),
    ("Increased Critical Strikes Support", MultiplierKind::Increased, 1.35),
    ("Increased Critical Damage Support", MultiplierKind::Increased, 1.38),
];

/// Table entry for a gem, accepting names with or without " Support"
pub fn support_multiplier(name: &str) -> Option<(MultiplierKind, f64)> {
    let lookup = |n: &str| {
        SUPPORT_MULTIPLIERS
            .iter()
            .find(|(entry, _, _)| *entry == n)
            .map(|(_, kind, value)| (*kind, *value))
    };
    lookup(name).or_else(|| lookup(&format!("{} Support", name)))
}

/// prod(more) * (1 + sum(increased - 1)) over enabled gems, rounded to 2dp
///
/// Gems are folded in name order, so the result does not depend on the
/// order they were socketed in.
pub fn total_multiplier(gems: &[Gem]) -> f64 {
    multiplier_of(gems)
}

fn multiplier_of<'g>(gems: impl IntoIterator<Item = &'g Gem>) -> f64 {
    let mut names: Vec<&str> = gems
        .into_iter()
        .filter(|g| g.enabled)
        .map(|g| g.name.as_str())
        .collect();
    names.sort_unstable();

    let mut more = 1.0;
    let mut increased = 0.0;
    for name in names {
        match support_multiplier(name) {
            Some((MultiplierKind::More, value)) => more *= value,
            Some((MultiplierKind::Increased, value)) => increased += value - 1.0,
            None => {}
        }
    }

    round2(more * (1.0 + increased))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Analysis Records
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveGemDifferenceKind {
    DifferentSkill,
    LevelGap,
    QualityGap,
    QualityVariant,
}

impl fmt::Display for ActiveGemDifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DifferentSkill => write!(f, "different skill"),
            Self::LevelGap => write!(f, "level gap"),
            Self::QualityGap => write!(f, "quality gap"),
            Self::QualityVariant => write!(f, "quality variant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveGemDifference {
    pub kind: ActiveGemDifferenceKind,
    pub severity: Priority,
    pub current: DiffValue,
    pub target: DiffValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveGemStatus {
    Compared,
    /// One side has no active gem
    MissingData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveGemAnalysis {
    pub status: ActiveGemStatus,
    pub differences: Vec<ActiveGemDifference>,
}

impl ActiveGemAnalysis {
    pub fn has_differences(&self) -> bool {
        !self.differences.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwakenedUpgrade {
    pub current: String,
    pub upgrade_to: String,
    pub multiplier_gain: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportGemAnalysis {
    pub missing_supports: Vec<String>,
    pub extra_supports: Vec<String>,
    pub awakened_upgrades: Vec<AwakenedUpgrade>,
    /// Share of target supports the player also runs, 0-100
    pub match_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierComparison {
    pub player: f64,
    pub target: f64,
    pub gap: f64,
    pub gap_percentage: f64,
}

impl MultiplierComparison {
    pub fn new(player: f64, target: f64) -> Self {
        let gap = target - player;
        let gap_percentage = if player > 0.0 { gap / player * 100.0 } else { 0.0 };
        Self {
            player,
            target,
            gap,
            gap_percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GemCombinationAnalysis {
    pub active_gem_analysis: ActiveGemAnalysis,
    pub support_gem_analysis: SupportGemAnalysis,
    pub multiplier_comparison: MultiplierComparison,
    /// 0-100
    pub optimization_score: f64,
}

// =============================================================================
// Analysis
// =============================================================================

pub fn analyze_gem_combination(player_gems: &[Gem], target_gems: &[Gem]) -> GemCombinationAnalysis {
    let (player_active, player_supports): (Vec<&Gem>, Vec<&Gem>) =
        player_gems.iter().partition(|g| !g.is_support);
    let (target_active, target_supports): (Vec<&Gem>, Vec<&Gem>) =
        target_gems.iter().partition(|g| !g.is_support);

    let active_gem_analysis =
        compare_active(player_active.first().copied(), target_active.first().copied());
    let support_gem_analysis = compare_supports(&player_supports, &target_supports);

    let multiplier_comparison = MultiplierComparison::new(
        multiplier_of(player_supports.iter().copied()),
        multiplier_of(target_supports.iter().copied()),
    );

    GemCombinationAnalysis {
        active_gem_analysis,
        support_gem_analysis,
        multiplier_comparison,
        optimization_score: optimization_score(player_gems, target_gems),
    }
}

fn compare_active(player: Option<&Gem>, target: Option<&Gem>) -> ActiveGemAnalysis {
    let (Some(player), Some(target)) = (player, target) else {
        return ActiveGemAnalysis {
            status: ActiveGemStatus::MissingData,
            differences: Vec::new(),
        };
    };

    let mut differences = Vec::new();

    if player.name != target.name {
        differences.push(ActiveGemDifference {
            kind: ActiveGemDifferenceKind::DifferentSkill,
            severity: Priority::Critical,
            current: player.name.as_str().into(),
            target: target.name.as_str().into(),
            gap: None,
        });
    }

    if target.level > player.level {
        let gap = target.level - player.level;
        differences.push(ActiveGemDifference {
            kind: ActiveGemDifferenceKind::LevelGap,
            severity: if gap >= 3 { Priority::High } else { Priority::Medium },
            current: player.level.into(),
            target: target.level.into(),
            gap: Some(gap),
        });
    }

    if target.quality > player.quality {
        differences.push(ActiveGemDifference {
            kind: ActiveGemDifferenceKind::QualityGap,
            severity: Priority::Medium,
            current: player.quality.into(),
            target: target.quality.into(),
            gap: Some(target.quality - player.quality),
        });
    }

    if player.quality_variant != target.quality_variant {
        differences.push(ActiveGemDifference {
            kind: ActiveGemDifferenceKind::QualityVariant,
            severity: Priority::Low,
            current: player.quality_variant.to_string().into(),
            target: target.quality_variant.to_string().into(),
            gap: None,
        });
    }

    ActiveGemAnalysis {
        status: ActiveGemStatus::Compared,
        differences,
    }
}

fn compare_supports(player: &[&Gem], target: &[&Gem]) -> SupportGemAnalysis {
    let player_names = unique_names(player);
    let target_names = unique_names(target);
    let player_set: HashSet<&str> = player_names.iter().copied().collect();
    let target_set: HashSet<&str> = target_names.iter().copied().collect();

    let missing_supports = target_names
        .iter()
        .filter(|n| !player_set.contains(*n))
        .map(|n| n.to_string())
        .collect();
    let extra_supports = player_names
        .iter()
        .filter(|n| !target_set.contains(*n))
        .map(|n| n.to_string())
        .collect();

    let mut awakened_upgrades = Vec::new();
    for gem in target.iter().filter(|g| g.is_awakened) {
        let base = gem.name.strip_prefix(AWAKENED_PREFIX).unwrap_or(&gem.name);
        if player_set.contains(base) {
            awakened_upgrades.push(AwakenedUpgrade {
                current: base.to_string(),
                upgrade_to: gem.name.clone(),
                multiplier_gain: AWAKENED_MULTIPLIER_GAIN,
            });
        }
    }

    let match_rate = if target_set.is_empty() {
        100.0
    } else {
        let shared = target_set.intersection(&player_set).count();
        shared as f64 / target_set.len() as f64 * 100.0
    };

    SupportGemAnalysis {
        missing_supports,
        extra_supports,
        awakened_upgrades,
        match_rate,
    }
}

fn unique_names<'g>(gems: &[&'g Gem]) -> Vec<&'g str> {
    let mut seen = HashSet::new();
    gems.iter()
        .map(|g| g.name.as_str())
        .filter(|n| seen.insert(*n))
        .collect()
}

/// 100 - 15 per missing gem - 2 per level and 0.5 per quality behind
fn optimization_score(player: &[Gem], target: &[Gem]) -> f64 {
    let player_names: HashSet<&str> = player.iter().map(|g| g.name.as_str()).collect();
    let target_names: HashSet<&str> = target.iter().map(|g| g.name.as_str()).collect();

    let mut score = 100.0 - 15.0 * target_names.difference(&player_names).count() as f64;

    for target_gem in target {
        if let Some(player_gem) = player.iter().find(|g| g.name == target_gem.name) {
            score -= 2.0 * target_gem.level.saturating_sub(player_gem.level) as f64;
            score -= 0.5 * target_gem.quality.saturating_sub(player_gem.quality) as f64;
        }
    }

    score.max(0.0)
}
