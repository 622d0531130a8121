//! Configuration and data directory resolution
//!
//! Settings live in config.toml inside the larder data directory.
//! Missing file or missing keys fall back to defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub learning: LearningConfig,
    pub summary: SummaryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Minimum history records before a pattern is learned
    pub min_records: usize,
    /// How far back to read history, in weeks
    pub lookback_weeks: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Maximum recommendations surfaced in the summary
    pub max_recommendations: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            min_records: 2,
            lookback_weeks: 12,
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_recommendations: 5,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults if absent
    pub fn load(config_path: &Path) -> Result<Config> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config_path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }
}

/// Resolve the larder data directory
///
/// A `.larder` directory in the current project wins; otherwise the
/// home directory is used.
pub fn larder_dir() -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    let project_larder = cwd.join(".larder");
    if project_larder.exists() {
        return Ok(project_larder);
    }

    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home.join(".larder"))
}

/// Path of the larder database
pub fn db_path() -> Result<PathBuf> {
    Ok(larder_dir()?.join("larder.sqlite"))
}
