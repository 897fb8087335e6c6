//! The resolver's output record and its settings representation.

use std::fmt;

use crate::capability::{AudioType, CapabilityRegistry, PlayerMode};
use crate::settings::{keys, SettingsMap, SettingsStack};

// ---------------------------------------------------------------------------
// TranscoderChoice
// ---------------------------------------------------------------------------

/// A transcoder inserted between engine and player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscoderChoice {
    pub id: String,
    pub input: AudioType,
    pub output: AudioType,
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// A consistent engine / player / mode / format / cache / transcoder tuple.
///
/// Never mutated once returned; a new resolution replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub engine_id: String,
    /// `None` when the engine voices itself.
    pub player_id: Option<String>,
    /// Format written by the engine ([`AudioType::None`] when self-voicing).
    pub engine_audio: AudioType,
    pub player_mode: PlayerMode,
    pub transcoder: Option<TranscoderChoice>,
    pub use_cache: bool,
    /// Produced by a healing pass rather than a fresh choice.
    pub repair_mode: bool,
    /// At least one stored value had to be overridden.
    pub repairs_made: bool,
}

impl EngineConfig {
    pub(crate) fn self_voicing(engine_id: &str) -> Self {
        Self {
            engine_id: engine_id.to_string(),
            player_id: None,
            engine_audio: AudioType::None,
            player_mode: PlayerMode::EngineSpeak,
            transcoder: None,
            use_cache: false,
            repair_mode: false,
            repairs_made: false,
        }
    }

    pub fn is_self_voicing(&self) -> bool {
        self.player_id.is_none()
    }

    /// Format the player receives: the transcoder's output if one is used.
    pub fn player_audio(&self) -> AudioType {
        self.transcoder
            .as_ref()
            .map_or(self.engine_audio, |t| t.output)
    }

    /// Equal apart from the repair bookkeeping fields.
    pub fn same_selection(&self, other: &EngineConfig) -> bool {
        self.engine_id == other.engine_id
            && self.player_id == other.player_id
            && self.engine_audio == other.engine_audio
            && self.player_mode == other.player_mode
            && self.transcoder == other.transcoder
            && self.use_cache == other.use_cache
    }

    /// Check the config against the registry's current capabilities.
    pub fn is_valid(&self, registry: &CapabilityRegistry) -> bool {
        let Some(engine) = registry.engine(&self.engine_id).filter(|e| e.enabled) else {
            return false;
        };

        let Some(player_id) = self.player_id.as_deref() else {
            return self.player_mode == PlayerMode::EngineSpeak
                && !self.use_cache
                && self.transcoder.is_none()
                && engine.is_self_voicing();
        };

        let Some(player) = registry.player(player_id).filter(|p| p.enabled) else {
            return false;
        };

        let transcoder_ok = match &self.transcoder {
            None => true,
            Some(t) => registry.transcoder(&t.id).is_some_and(|info| {
                info.enabled && info.input == t.input && info.output == t.output
            }) && t.input == self.engine_audio,
        };

        transcoder_ok
            && engine.produces(self.engine_audio)
            && player.accepts(self.player_audio())
            && self.player_mode.uses_player()
            && engine.supports_mode(self.player_mode)
            && player.supports_mode(self.player_mode)
            && (!self.use_cache || (engine.supports_cache && player.supports_cache))
    }

    // -----------------------------------------------------------------------
    // Settings round trip
    // -----------------------------------------------------------------------

    /// Write this config into the top frame of `stack`.
    ///
    /// Keys: `engine`, and `<engine>.player`, `.player_mode`, `.audio_type`,
    /// `.cache_speech`, `.transcoder`. A missing player or transcoder removes
    /// its key.
    pub fn store(&self, stack: &SettingsStack) {
        let key = |setting: &str| keys::service_key(&self.engine_id, setting);
        stack.transaction(|s| {
            s.set(keys::ENGINE, self.engine_id.as_str());
            match &self.player_id {
                Some(player) => s.set(&key(keys::PLAYER), player.as_str()),
                None => s.remove(&key(keys::PLAYER)),
            };
            s.set(&key(keys::PLAYER_MODE), self.player_mode.as_str());
            s.set(&key(keys::AUDIO_TYPE), self.engine_audio.as_str());
            s.set(&key(keys::CACHE_SPEECH), self.use_cache);
            match &self.transcoder {
                Some(t) => s.set(&key(keys::TRANSCODER), t.id.as_str()),
                None => s.remove(&key(keys::TRANSCODER)),
            };
        });
    }

    /// Rebuild the active engine's config from a settings map, typically the
    /// committed snapshot from [`SettingsStack::current_settings`].
    ///
    /// Returns `None` when no engine is stored or a stored value cannot be
    /// interpreted. No compatibility check is made; see
    /// [`is_valid`](Self::is_valid).
    pub fn from_settings(values: &SettingsMap, registry: &CapabilityRegistry) -> Option<Self> {
        let engine_id = values.get(keys::ENGINE)?.as_str()?.to_string();
        let get = |setting: &str| values.get(&keys::service_key(&engine_id, setting));

        let player_id = get(keys::PLAYER)
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let player_mode = get(keys::PLAYER_MODE)?.as_str()?.parse().ok()?;
        let engine_audio = get(keys::AUDIO_TYPE)?.as_str()?.parse().ok()?;
        let use_cache = get(keys::CACHE_SPEECH)
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let transcoder = match get(keys::TRANSCODER).and_then(|v| v.as_str()) {
            None => None,
            Some(id) => {
                let info = registry.transcoder(id)?;
                Some(TranscoderChoice {
                    id: info.id.clone(),
                    input: info.input,
                    output: info.output,
                })
            }
        };

        Some(Self {
            engine_id,
            player_id,
            engine_audio,
            player_mode,
            transcoder,
            use_cache,
            repair_mode: false,
            repairs_made: false,
        })
    }
}

impl fmt::Display for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.player_id {
            None => write!(f, "{} (self-voicing)", self.engine_id),
            Some(player) => {
                write!(f, "{} --{}--> ", self.engine_id, self.engine_audio)?;
                if let Some(t) = &self.transcoder {
                    write!(f, "{} --{}--> ", t.id, t.output)?;
                }
                write!(f, "{player} [{}", self.player_mode)?;
                if self.use_cache {
                    f.write_str(", cached")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
