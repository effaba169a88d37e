//! Build Compare
//!
//! Normalizes exported character builds into a canonical model and produces
//! a prioritized list of differences between a player's build and a target
//! build.
//!
//! ## Features
//!
//! - **Extraction**: Decoded build records become a [`StandardizedCharacter`]; missing
//!   sections degrade to empty sub-models with [`Diagnostics`]
//! - **Skill Graph**: Passive tree adjacency with node classification and shortest
//!   (hop-count) paths from an allocation
//! - **Priority Comparison**: Base passes plus configurable analyzer stages, ordered
//!   critical first
//! - **Domain Analyzers**: Equipment base/modifier gaps, support gem multipliers,
//!   link difficulty
//!
//! ## Data Flow
//!
//! ```text
//! RecordNode ──► BuildExtractor ──► StandardizedCharacter ─┐
//!                      ▲                                   ├─► ComparisonEngine ──► ComparisonReport
//!                ReferenceData ────────────────────────────┘
//!           (gem table, skill graph)
//! ```

pub mod analyzers;
pub mod compare;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod record;
pub mod reference;
pub mod tree;

pub use compare::{
    ComparisonDifference, ComparisonEngine, ComparisonReport, ComparisonSummary, DifferenceCategory,
    Priority,
};
pub use config::{CompareConfig, EngineConfig};
pub use error::{BuildError, Result};
pub use extract::{BuildExtractor, Diagnostics};
pub use model::StandardizedCharacter;
pub use record::RecordNode;
pub use reference::{GemTable, ReferenceData};
pub use tree::{PathFinder, SkillGraph};
