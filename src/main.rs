//! Application entry point: validates and repairs the stored speech
//! configuration.
//!
//! # Startup sequence
//!
//! 1. Load [`AppConfig`] from disk (returns default on first run).
//! 2. Initialise logging with the configured default filter.
//! 3. Build the [`CapabilityRegistry`](voice_pipeline_config::capability::CapabilityRegistry).
//! 4. Open the [`SettingsStack`] over `settings.toml`.
//! 5. Repair the requested engine (first CLI argument, else the stored one),
//!    falling back through the default and fallback engines.
//! 6. Commit the surviving configuration.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use voice_pipeline_config::{
    config::{AppConfig, AppPaths},
    resolver::{ConfigResolver, EngineConfig},
    settings::{keys, SettingsStack, TomlSettingsStore},
};

// ---------------------------------------------------------------------------
// Repair with fallback
// ---------------------------------------------------------------------------

/// Try each engine in `engines` until one yields a valid configuration.
///
/// Every attempt runs in its own frame; failed attempts are rolled back.
fn repair_with_fallback(
    resolver: &ConfigResolver<'_>,
    stack: &SettingsStack,
    engines: &[String],
) -> Result<EngineConfig> {
    for engine in engines {
        let depth = stack.push();
        stack.set(keys::ENGINE, engine.as_str());

        match resolver.repair_engine(engine, stack) {
            Ok(config) => {
                stack.merge_down()?;
                return Ok(config);
            }
            Err(e) => {
                log::warn!("{e}; trying next engine");
                stack.restore(depth - 1)?;
            }
        }
    }
    bail!("no usable speech engine among {engines:?}")
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let paths = AppPaths::new();

    // 1. Configuration (logging is not up yet, report problems afterwards)
    let (config, config_error) = match AppConfig::load_from(&paths.config_file) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // 2. Logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_level.as_str()),
    )
    .init();
    log::info!("voice pipeline configuration starting up");
    if let Some(e) = config_error {
        log::warn!("Failed to load config ({e:#}); using defaults");
    }

    // 3. Capability registry
    let registry = config
        .registry
        .build(&paths.capabilities_file)
        .context("building capability registry")?;

    // 4. Settings stack
    let store = Arc::new(TomlSettingsStore::new(&paths.settings_file));
    let stack = SettingsStack::open(store)
        .with_context(|| format!("opening {}", paths.settings_file.display()))?;

    // 5. Repair
    let requested = std::env::args().nth(1).or_else(|| stack.get_str(keys::ENGINE));
    let engines = config.engine_candidates(requested.as_deref());
    let resolver = ConfigResolver::new(&registry);
    let engine_config = repair_with_fallback(&resolver, &stack, &engines)?;

    if engine_config.repairs_made {
        log::info!("stored configuration repaired");
    }

    // 6. Commit, then read back what background consumers will see
    stack.commit_all()?;
    match EngineConfig::from_settings(&stack.current_settings(), &registry) {
        Some(active) => {
            log::info!("active configuration: {active}");
            println!("{active}");
        }
        None => bail!("committed settings do not describe {engine_config}"),
    }
    Ok(())
}
