//! Configuration module.
//!
//! Provides `AppConfig` (application settings and registry sources),
//! `AppPaths` for cross-platform file locations, and TOML persistence via
//! `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, RegistryConfig};
