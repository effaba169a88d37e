//! Configuration management for build comparison
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (build-compare.toml)
//! - Environment variables (BUILD_COMPARE__*)
//!
//! ## Example config file (build-compare.toml):
//! ```toml
//! [engine]
//! stages = ["passive_paths", "equipment_depth", "gem_depth"]
//! max_path_suggestions = 3
//! multiplier_gap_threshold = 5.0
//! core_slots = ["weapon_main_hand", "body_armour"]
//! fallback_link_rarity = "RARE"
//!
//! [reference]
//! gem_table = "data/gems.json"
//! skill_tree = "data/skill_tree.json"
//!
//! [output]
//! format = "pretty"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compare::AnalyzerStage;
use crate::model::{Rarity, Slot};
use crate::reference::ReferenceData;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Comparison engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Reference data locations
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Comparison engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Analyzer stages run after the base passes, in order
    #[serde(default = "default_stages")]
    pub stages: Vec<AnalyzerStage>,

    /// Path suggestions kept by the passive_paths stage
    #[serde(default = "default_max_path_suggestions")]
    pub max_path_suggestions: usize,

    /// Support multiplier gap (percent) above which gem_depth reports
    #[serde(default = "default_multiplier_gap_threshold")]
    pub multiplier_gap_threshold: f64,

    /// Slots examined by the equipment_depth stage
    #[serde(default = "default_core_slots")]
    pub core_slots: Vec<String>,

    /// Rarity assumed for link evaluation when the main-skill item is unknown
    #[serde(default = "default_fallback_link_rarity")]
    pub fallback_link_rarity: Rarity,
}

/// Reference data configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Gem metadata table (JSON)
    #[serde(default)]
    pub gem_table: Option<PathBuf>,

    /// Passive tree payload (JSON)
    #[serde(default)]
    pub skill_tree: Option<PathBuf>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON layout (pretty or compact)
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

// Default value functions
fn default_stages() -> Vec<AnalyzerStage> {
    AnalyzerStage::ALL.to_vec()
}

fn default_max_path_suggestions() -> usize {
    3
}

fn default_multiplier_gap_threshold() -> f64 {
    5.0
}

fn default_core_slots() -> Vec<String> {
    vec![
        Slot::WeaponMainHand.key().to_string(),
        Slot::BodyArmour.key().to_string(),
    ]
}

fn default_fallback_link_rarity() -> Rarity {
    Rarity::Rare
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stages: default_stages(),
            max_path_suggestions: default_max_path_suggestions(),
            multiplier_gap_threshold: default_multiplier_gap_threshold(),
            core_slots: default_core_slots(),
            fallback_link_rarity: default_fallback_link_rarity(),
        }
    }
}

impl EngineConfig {
    /// Base passes only
    pub fn without_stages() -> Self {
        Self {
            stages: Vec::new(),
            ..Self::default()
        }
    }

    pub fn runs(&self, stage: AnalyzerStage) -> bool {
        self.stages.contains(&stage)
    }
}

impl CompareConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a required file on top of the defaults
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "build-compare.toml",
            ".build-compare.toml",
            "config/build-compare.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(dirs) = directories::ProjectDirs::from("dev", "familiar", "build-compare") {
            let xdg_config = dirs.config_dir().join("build-compare.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // BUILD_COMPARE__ENGINE__MAX_PATH_SUGGESTIONS=5
        builder = builder.add_source(
            Environment::with_prefix("BUILD_COMPARE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Load the configured reference tables; missing files degrade with a warning
    pub fn load_reference_data(&self) -> ReferenceData {
        ReferenceData::load(
            self.reference.gem_table.as_deref(),
            self.reference.skill_tree.as_deref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CompareConfig::default();
        assert_eq!(config.engine.stages.len(), 3);
        assert_eq!(config.engine.max_path_suggestions, 3);
        assert_eq!(config.engine.multiplier_gap_threshold, 5.0);
        assert_eq!(config.engine.core_slots, vec!["weapon_main_hand", "body_armour"]);
        assert_eq!(config.engine.fallback_link_rarity, Rarity::Rare);
        assert!(config.reference.gem_table.is_none());
    }

    #[test]
    fn test_serialize_config() {
        let config = CompareConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[engine]"));
        assert!(toml_str.contains("gem_depth"));
    }

    #[test]
    fn test_load_explicit_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[engine]\nstages = [\"gem_depth\"]\nmax_path_suggestions = 5\n\n[output]\nformat = \"compact\""
        )
        .unwrap();

        let config = CompareConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.engine.stages, vec![AnalyzerStage::GemDepth]);
        assert_eq!(config.engine.max_path_suggestions, 5);
        assert_eq!(config.engine.multiplier_gap_threshold, 5.0);
        assert_eq!(config.output.format, OutputFormat::Compact);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build-compare.toml");

        let mut config = CompareConfig::default();
        config.engine.core_slots = vec!["helmet".to_string()];
        config.save(&path).unwrap();

        let loaded = CompareConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.engine.core_slots, vec!["helmet"]);
    }

    #[test]
    fn test_missing_explicit_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CompareConfig::load_from(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
