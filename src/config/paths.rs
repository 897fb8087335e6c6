//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout (config dir):
//!   Windows: %APPDATA%\voice-pipeline\
//!   macOS:   ~/Library/Application Support/voice-pipeline/
//!   Linux:   ~/.config/voice-pipeline/

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory holding every file below.
    pub config_dir: PathBuf,
    /// Application config (`config.toml`).
    pub config_file: PathBuf,
    /// Persisted settings store seeding the base frame (`settings.toml`).
    pub settings_file: PathBuf,
    /// Optional extra adapter descriptors (`capabilities.toml`).
    pub capabilities_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voice-pipeline";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// config directory.
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);
        Self::in_dir(config_dir)
    }

    /// Lay the files out under an explicit directory (tests, portable installs).
    pub fn in_dir(config_dir: impl AsRef<Path>) -> Self {
        let config_dir = config_dir.as_ref().to_path_buf();
        Self {
            config_file: config_dir.join("config.toml"),
            settings_file: config_dir.join("settings.toml"),
            capabilities_file: config_dir.join("capabilities.toml"),
            config_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_non_empty() {
        let paths = AppPaths::new();
        assert!(paths.config_dir.to_str().is_some_and(|s| !s.is_empty()));
        assert!(paths
            .settings_file
            .file_name()
            .is_some_and(|n| n == "settings.toml"));
        assert!(paths
            .capabilities_file
            .file_name()
            .is_some_and(|n| n == "capabilities.toml"));
    }

    #[test]
    fn in_dir_places_files_together() {
        let paths = AppPaths::in_dir("/tmp/vp");
        assert_eq!(paths.config_file, PathBuf::from("/tmp/vp/config.toml"));
        assert_eq!(paths.settings_file.parent(), Some(Path::new("/tmp/vp")));
    }
}
