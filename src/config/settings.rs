//! Application configuration structs, defaults and TOML persistence.
//!
//! This is the application's own configuration (logging, engine choice,
//! registry sources). Engine/player selections live in the settings stack
//! and its store, not here.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::capability::{
    builtin_descriptors, load_descriptors, CapabilityError, CapabilityRegistry, RegistryBuilder,
};

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Where the capability registry's descriptors come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Register the adapters shipped with the crate.
    pub use_builtin: bool,
    /// Extra descriptor file; `None` means `capabilities.toml` in the config
    /// directory, if present.
    pub descriptors_file: Option<PathBuf>,
    /// Adapter ids registered but marked disabled (e.g. not installed).
    pub disabled: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            use_builtin: true,
            descriptors_file: None,
            disabled: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// Build the registry: built-ins, then the descriptor file, then the
    /// disabled list.
    ///
    /// `default_file` is only read when it exists; an explicit
    /// `descriptors_file` must exist.
    pub fn build(&self, default_file: &Path) -> Result<CapabilityRegistry, CapabilityError> {
        let mut builder = RegistryBuilder::new();
        if self.use_builtin {
            builder = builder.extend(builtin_descriptors());
        }

        match &self.descriptors_file {
            Some(path) => builder = builder.extend(load_descriptors(path)?),
            None if default_file.exists() => {
                builder = builder.extend(load_descriptors(default_file)?)
            }
            None => {}
        }

        Ok(self
            .disabled
            .iter()
            .fold(builder, |b, id| b.disable(id.as_str()))
            .build())
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `config.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use voice_pipeline_config::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Engine used when no engine is stored yet.
    pub default_engine: String,
    /// Engines tried in order when the stored engine cannot be configured.
    pub fallback_engines: Vec<String>,
    /// Capability registry sources.
    pub registry: RegistryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            default_engine: "espeak".into(),
            fallback_engines: vec!["piper".into(), "espeak".into()],
            registry: RegistryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `config.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().config_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `config.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().config_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Engines to try at startup: `stored` (if any), then the default, then
    /// the fallbacks, without duplicates.
    pub fn engine_candidates(&self, stored: Option<&str>) -> Vec<String> {
        let mut engines: Vec<String> = Vec::new();
        let all = stored
            .into_iter()
            .chain(std::iter::once(self.default_engine.as_str()))
            .chain(self.fallback_engines.iter().map(String::as_str));
        for engine in all {
            if !engine.is_empty() && !engines.iter().any(|e| e == engine) {
                engines.push(engine.to_string());
            }
        }
        engines
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
