//! [`ConfigResolver`]: capability negotiation between an engine and the
//! registered players and transcoders.
//!
//! # Search order (first success wins)
//!
//! ```text
//! 1. self-voicing shortcut      engine speaks itself, no player
//! 2. validate forced values     incompatible wishes are dropped
//! 3. forced player, direct      engine format → forced player
//! 4. forced player, transcoded  engine format → transcoder → forced player
//! 5. open search                default player, then enabled players
//! 6. open search, transcoded    transcoder to a format the engine lacks
//! 7. NoConfiguration
//! ```
//!
//! Tie-breaks: caller wish > registry default > first enabled candidate in
//! registry order. Caching is preferred but never required.

use std::fmt;
use std::str::FromStr;

use crate::capability::{
    AudioType, CapabilityRegistry, EngineInfo, PlayerInfo, PlayerMode, TranscoderInfo,
};
use crate::settings::{keys, SettingValue, SettingsStack};

use super::engine_config::{EngineConfig, TranscoderChoice};
use super::error::ResolveError;
use super::request::ResolveRequest;
use super::search::{audio_candidates, find_best_config, PlayerMatch};
use super::transcoder::TranscoderLocator;

// ---------------------------------------------------------------------------
// Repair bookkeeping
// ---------------------------------------------------------------------------

/// Collects overridden caller wishes during one resolution.
struct Repairs<'a> {
    engine_id: &'a str,
    repair_mode: bool,
    made: bool,
}

impl<'a> Repairs<'a> {
    fn new(engine_id: &'a str, repair_mode: bool) -> Self {
        Self {
            engine_id,
            repair_mode,
            made: false,
        }
    }

    fn record(&mut self, what: fmt::Arguments<'_>) {
        self.made = true;
        if self.repair_mode {
            log::info!("repairing {}: {}", self.engine_id, what);
        } else {
            log::info!("{}: {}", self.engine_id, what);
        }
    }

    /// Only a repair pass reports repairs.
    fn made(&self) -> bool {
        self.repair_mode && self.made
    }
}

/// Forced values that survived validation.
#[derive(Debug, Clone, Copy)]
struct Wanted<'r> {
    player: Option<&'r PlayerInfo>,
    audio: Option<AudioType>,
    mode: Option<PlayerMode>,
    cache: Option<bool>,
}

// ---------------------------------------------------------------------------
// ConfigResolver
// ---------------------------------------------------------------------------

/// Produces and repairs [`EngineConfig`]s from registry capabilities.
///
/// Resolution is pure: the same registry and request always give the same
/// result. Writing the result into a settings frame is a separate step
/// ([`resolve_into`](Self::resolve_into)).
///
/// ```
/// use voice_pipeline_config::capability::{builtin_descriptors, RegistryBuilder};
/// use voice_pipeline_config::resolver::{ConfigResolver, ResolveRequest};
///
/// let registry = RegistryBuilder::new().extend(builtin_descriptors()).build();
/// let resolver = ConfigResolver::new(&registry);
///
/// let config = resolver.resolve(&ResolveRequest::new("piper")).unwrap();
/// assert_eq!(config.player_id.as_deref(), Some("mpv"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConfigResolver<'r> {
    registry: &'r CapabilityRegistry,
    transcoders: TranscoderLocator<'r>,
}

impl<'r> ConfigResolver<'r> {
    pub fn new(registry: &'r CapabilityRegistry) -> Self {
        Self {
            registry,
            transcoders: TranscoderLocator::new(registry),
        }
    }

    pub fn registry(&self) -> &'r CapabilityRegistry {
        self.registry
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Negotiate a configuration for `request.engine_id`.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::UnknownEngine`] / [`ResolveError::EngineDisabled`]
    /// - [`ResolveError::NoConfiguration`] when every path is exhausted.
    pub fn resolve(&self, request: &ResolveRequest) -> Result<EngineConfig, ResolveError> {
        let engine = self
            .registry
            .engine(&request.engine_id)
            .ok_or_else(|| ResolveError::UnknownEngine(request.engine_id.clone()))?;
        if !engine.enabled {
            return Err(ResolveError::EngineDisabled(engine.id.clone()));
        }

        let mut repairs = Repairs::new(&engine.id, request.repair);

        let config = match self.self_voicing(engine, request, &mut repairs) {
            Some(config) => config,
            None => self.search(engine, request, &mut repairs)?,
        };

        let config = EngineConfig {
            repair_mode: request.repair,
            repairs_made: repairs.made(),
            ..config
        };
        log::debug!("resolved {config}");
        Ok(config)
    }

    /// Step 1: the engine renders audio itself.
    fn self_voicing(
        &self,
        engine: &EngineInfo,
        request: &ResolveRequest,
        repairs: &mut Repairs<'_>,
    ) -> Option<EngineConfig> {
        if !engine.is_self_voicing() {
            return None;
        }
        let requested = request.player_mode == Some(PlayerMode::EngineSpeak);
        // Unconstrained requests speak through the engine even when its
        // declared default mode uses a player.
        let unconstrained = request.player.is_none() && request.player_mode.is_none();
        let only_choice = !engine.player_modes.iter().any(|m| m.uses_player());
        if !(requested || unconstrained || only_choice) {
            return None;
        }

        if let Some(player) = &request.player {
            repairs.record(format_args!("player {player} dropped, engine speaks itself"));
        }
        if let Some(mode) = request.player_mode.filter(|m| m.uses_player()) {
            repairs.record(format_args!("player mode {mode} dropped, engine speaks itself"));
        }
        if request.use_cache == Some(true) {
            repairs.record(format_args!("caching dropped, engine speaks itself"));
        }
        Some(EngineConfig::self_voicing(&engine.id))
    }

    /// Steps 2 through 7.
    fn search(
        &self,
        engine: &EngineInfo,
        request: &ResolveRequest,
        repairs: &mut Repairs<'_>,
    ) -> Result<EngineConfig, ResolveError> {
        let wanted = self.validate_forced(engine, request, repairs);

        if let Some(player) = wanted.player {
            if let Some(config) = self.forced_player(engine, player, &wanted, repairs) {
                return Ok(config);
            }
            repairs.record(format_args!(
                "player {} cannot play this engine's audio, searching",
                player.id
            ));
        }

        let candidates = self.open_candidates(engine);

        if let Some(config) = self.open_search(engine, &candidates, &wanted, repairs) {
            return Ok(config);
        }
        if let Some(config) = self.transcoded_search(engine, &candidates, &wanted, repairs) {
            return Ok(config);
        }

        log::warn!("no usable configuration for engine {}", engine.id);
        Err(ResolveError::NoConfiguration {
            engine: engine.id.clone(),
        })
    }

    /// Step 2: keep only forced values the registry accepts for `engine`.
    fn validate_forced(
        &self,
        engine: &EngineInfo,
        request: &ResolveRequest,
        repairs: &mut Repairs<'_>,
    ) -> Wanted<'r> {
        let allows = |setting: &str, value: SettingValue| {
            self.registry
                .validator(&engine.id, setting)
                .is_some_and(|v| v.is_value_valid(&value))
        };

        let player = request.player.as_deref().and_then(|id| {
            let found = self
                .registry
                .player(id)
                .filter(|p| p.enabled && allows(keys::PLAYER, id.into()));
            if found.is_none() {
                repairs.record(format_args!("player {id} is unavailable"));
            }
            found
        });

        let mode = request.player_mode.and_then(|mode| {
            if mode.uses_player() && allows(keys::PLAYER_MODE, mode.as_str().into()) {
                Some(mode)
            } else {
                repairs.record(format_args!("player mode {mode} is unsupported"));
                None
            }
        });

        let cache = request.use_cache.and_then(|cache| {
            if allows(keys::CACHE_SPEECH, cache.into()) {
                Some(cache)
            } else {
                repairs.record(format_args!("caching is unsupported"));
                None
            }
        });

        let audio = request.audio_type.and_then(|audio| {
            if audio != AudioType::None && engine.produces(audio) {
                Some(audio)
            } else {
                repairs.record(format_args!("engine does not produce {audio}"));
                None
            }
        });

        Wanted {
            player,
            audio,
            mode,
            cache,
        }
    }

    /// Steps 3 and 4: only the forced player, directly or via a transcoder.
    fn forced_player(
        &self,
        engine: &EngineInfo,
        player: &'r PlayerInfo,
        wanted: &Wanted<'r>,
        repairs: &mut Repairs<'_>,
    ) -> Option<EngineConfig> {
        let only = [player];

        for audio in audio_candidates(engine, wanted.audio) {
            if let Some(found) = find_best_config(engine, audio, &only, wanted.mode, wanted.cache) {
                return Some(self.build(engine, audio, found, None, repairs));
            }
        }

        for transcoder in self
            .transcoders
            .candidates(&engine.output_formats, &player.input_formats)
        {
            if let Some(found) =
                find_best_config(engine, transcoder.output, &only, wanted.mode, wanted.cache)
            {
                return Some(self.build(engine, transcoder.input, found, Some(transcoder), repairs));
            }
        }
        None
    }

    /// The engine's default player first, then every enabled player in
    /// registry order.
    fn open_candidates(&self, engine: &EngineInfo) -> Vec<&'r PlayerInfo> {
        let mut candidates: Vec<&'r PlayerInfo> = Vec::new();
        candidates.extend(self.registry.default_player(&engine.id));
        for player in self.registry.enabled_players() {
            if !candidates.iter().any(|c| c.id == player.id) {
                candidates.push(player);
            }
        }
        candidates
    }

    /// Step 5: every format the engine writes, against every candidate.
    fn open_search(
        &self,
        engine: &EngineInfo,
        candidates: &[&'r PlayerInfo],
        wanted: &Wanted<'r>,
        repairs: &mut Repairs<'_>,
    ) -> Option<EngineConfig> {
        audio_candidates(engine, wanted.audio)
            .into_iter()
            .find_map(|audio| {
                find_best_config(engine, audio, candidates, wanted.mode, wanted.cache)
                    .map(|found| (audio, found))
            })
            .map(|(audio, found)| self.build(engine, audio, found, None, repairs))
    }

    /// Step 6: transcode into a format the engine cannot write itself.
    fn transcoded_search(
        &self,
        engine: &EngineInfo,
        candidates: &[&'r PlayerInfo],
        wanted: &Wanted<'r>,
        repairs: &mut Repairs<'_>,
    ) -> Option<EngineConfig> {
        for target in AudioType::PREFERENCE {
            if engine.produces(target) {
                continue;
            }
            let Some(transcoder) = self.transcoders.find_producing(&engine.output_formats, target)
            else {
                continue;
            };
            if let Some(found) =
                find_best_config(engine, target, candidates, wanted.mode, wanted.cache)
            {
                return Some(self.build(engine, transcoder.input, found, Some(transcoder), repairs));
            }
        }
        None
    }

    fn build(
        &self,
        engine: &EngineInfo,
        engine_audio: AudioType,
        found: PlayerMatch<'r>,
        transcoder: Option<&TranscoderInfo>,
        repairs: &mut Repairs<'_>,
    ) -> EngineConfig {
        if found.overrode_request {
            repairs.record(format_args!(
                "using {} in {} mode{}",
                found.player.id,
                found.mode,
                if found.use_cache { " with caching" } else { "" }
            ));
        }
        EngineConfig {
            engine_id: engine.id.clone(),
            player_id: Some(found.player.id.clone()),
            engine_audio,
            player_mode: found.mode,
            transcoder: transcoder.map(|t| TranscoderChoice {
                id: t.id.clone(),
                input: t.input,
                output: t.output,
            }),
            use_cache: found.use_cache,
            repair_mode: false,
            repairs_made: false,
        }
    }

    // -----------------------------------------------------------------------
    // Settings integration
    // -----------------------------------------------------------------------

    /// Resolve and write the result into the top frame of `stack`.
    ///
    /// Nothing is written on failure. The stack is not committed.
    pub fn resolve_into(
        &self,
        request: &ResolveRequest,
        stack: &SettingsStack,
    ) -> Result<EngineConfig, ResolveError> {
        stack.transaction(|stack| {
            let config = self.resolve(request)?;
            config.store(stack);
            Ok(config)
        })
    }

    /// Repair pass over the values stored for `engine_id` in the top frame.
    ///
    /// Stored values that no longer parse count as repairs.
    pub fn repair_engine(
        &self,
        engine_id: &str,
        stack: &SettingsStack,
    ) -> Result<EngineConfig, ResolveError> {
        stack.transaction(|stack| {
            let key = |setting: &str| keys::service_key(engine_id, setting);
            let mut corrupt = false;

            let player_mode: Option<PlayerMode> =
                parse_stored(stack, engine_id, keys::PLAYER_MODE, &mut corrupt);
            let audio_type: Option<AudioType> =
                parse_stored(stack, engine_id, keys::AUDIO_TYPE, &mut corrupt);

            let request = ResolveRequest {
                engine_id: engine_id.to_string(),
                player: stack.get_str(&key(keys::PLAYER)),
                audio_type: audio_type.filter(|a| *a != AudioType::None),
                player_mode,
                use_cache: stack.get_bool(&key(keys::CACHE_SPEECH)),
                repair: true,
            };

            let mut config = self.resolve(&request)?;
            config.repairs_made |= corrupt;
            config.store(stack);
            Ok(config)
        })
    }

    /// Repair pass for the engine named by the `engine` key of the top frame.
    pub fn repair_from_settings(&self, stack: &SettingsStack) -> Result<EngineConfig, ResolveError> {
        let engine_id = stack.get_str(keys::ENGINE).unwrap_or_default();
        self.repair_engine(&engine_id, stack)
    }
}

/// Parse a stored enum setting; an unparsable value sets `corrupt`.
fn parse_stored<T>(
    stack: &SettingsStack,
    engine_id: &str,
    setting: &str,
    corrupt: &mut bool,
) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = stack.get_str(&keys::service_key(engine_id, setting))?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(err) => {
            log::info!("repairing {engine_id}: ignoring stored {setting}: {err}");
            *corrupt = true;
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
