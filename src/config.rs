// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Layering, lowest first: built-in defaults, the user config file
//! (`trustroute.toml` in the platform config dir), an explicit `--config`
//! file, then `TRUSTROUTE_*` environment variables (`__` separates nesting,
//! e.g. `TRUSTROUTE_ENGINE__SEARCH__EPSILON=0.05`).

use crate::pathfind::SearchParams;
use crate::rank::RankingConfig;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of routes returned when the caller does not ask for a count
pub const DEFAULT_MAX_PATHS: usize = 3;
/// Hard cap on routes per request
pub const DEFAULT_MAX_PATHS_LIMIT: usize = 10;

/// Tuning for path search and ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Routes returned when no count is given
    pub default_max_paths: usize,
    /// Upper bound on requested routes
    pub max_paths_limit: usize,
    /// Path search tuning
    pub search: SearchParams,
    /// Ranking weights
    pub ranking: RankingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_max_paths: DEFAULT_MAX_PATHS,
            max_paths_limit: DEFAULT_MAX_PATHS_LIMIT,
            search: SearchParams::default(),
            ranking: RankingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Reject settings the algorithms cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.search.epsilon > 0.0 && self.search.epsilon.is_finite()) {
            bail!("engine.search.epsilon must be a positive number, got {}", self.search.epsilon);
        }
        if !(self.search.penalty_factor >= 1.0 && self.search.penalty_factor.is_finite()) {
            bail!("engine.search.penalty_factor must be >= 1, got {}", self.search.penalty_factor);
        }
        if self.ranking.strength_weight < 0.0 || self.ranking.efficiency_weight < 0.0 {
            bail!("engine.ranking weights must not be negative");
        }
        if !(self.ranking.base_days >= 0.0 && self.ranking.base_days.is_finite()) {
            bail!("engine.ranking.base_days must not be negative, got {}", self.ranking.base_days);
        }
        if !(self.ranking.days_per_hop >= 1.0 && self.ranking.days_per_hop.is_finite()) {
            bail!("engine.ranking.days_per_hop must be >= 1, got {}", self.ranking.days_per_hop);
        }
        if self.max_paths_limit == 0 {
            bail!("engine.max_paths_limit must be at least 1");
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// URL template for avatar/logo references, containing `{ref}`
    pub avatar_url_template: Option<String>,
    /// Engine tuning
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            avatar_url_template: None,
            engine: EngineConfig::default(),
        }
    }
}

/// Location of the per-user config file
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "trustroute")
        .map(|d| d.config_dir().join("trustroute.toml"))
}

/// Load configuration from defaults, files and the environment
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let mut builder = ::config::Config::builder().add_source(
        ::config::Config::try_from(&Config::default()).context("Failed to seed default config")?,
    );

    if let Some(path) = default_config_path() {
        builder = builder.add_source(::config::File::from(path).required(false));
    }
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("Config file not found: {}", path.display());
        }
        builder = builder.add_source(::config::File::from(path.to_path_buf()).required(true));
    }
    builder = builder.add_source(
        ::config::Environment::with_prefix("TRUSTROUTE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let loaded: Config = builder
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Failed to parse configuration")?;
    loaded.engine.validate()?;
    Ok(loaded)
}
