//! Domain Analyzers
//!
//! Pure functions over model records. Absent inputs produce empty results;
//! nothing here fails.
//!
//! - [`equipment`]: base comparison and modifier gaps for one slot
//! - [`gems`]: active/support comparison and the multiplier heuristic
//! - [`links`]: link requirement difficulty and cost

pub mod equipment;
pub mod gems;
pub mod links;

pub use equipment::{
    analyze_mod_gap, compare_equipment_base, BaseComparison, BaseDifference, BaseDifferenceKind,
    ModCategory, ModGapAnalysis, TierDifference,
};
pub use gems::{
    analyze_gem_combination, total_multiplier, ActiveGemAnalysis, ActiveGemDifference,
    ActiveGemDifferenceKind, AwakenedUpgrade, GemCombinationAnalysis, MultiplierComparison,
    SupportGemAnalysis,
};
pub use links::{evaluate_link_requirement, LinkCost, LinkDifficulty, LinkEvaluation};
