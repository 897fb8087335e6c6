//! Read-only capability registry consumed by the resolver.
//!
//! Built once at startup by [`RegistryBuilder`] from a list of
//! [`AdapterDescriptor`]s and never mutated afterwards. Unknown ids are
//! answered with "absent" (empty format sets, `false`, `None`) rather than an
//! error, so unregistered capabilities simply do not take part in a search.

use std::collections::HashSet;

use super::descriptor::{AdapterDescriptor, EngineInfo, PlayerInfo, SettingSpec, TranscoderInfo};
use super::types::{AudioType, PlayerMode};
use super::validator::Validator;
use crate::settings::{keys, SettingValue};

// ---------------------------------------------------------------------------
// RegistryBuilder
// ---------------------------------------------------------------------------

/// Collects descriptors and produces an immutable [`CapabilityRegistry`].
///
/// ```
/// use voice_pipeline_config::capability::{builtin_descriptors, RegistryBuilder};
///
/// let registry = RegistryBuilder::new()
///     .extend(builtin_descriptors())
///     .disable("paplay")
///     .build();
/// assert!(registry.player("paplay").is_some_and(|p| !p.enabled));
/// ```
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    descriptors: Vec<AdapterDescriptor>,
    disabled: HashSet<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one adapter.
    ///
    /// A descriptor of the same kind and id replaces the earlier one in place,
    /// keeping its registration position.
    pub fn add(mut self, descriptor: AdapterDescriptor) -> Self {
        match self.descriptors.iter_mut().find(|d| d.same_adapter(&descriptor)) {
            Some(existing) => {
                log::debug!("replacing adapter descriptor '{}'", descriptor.id());
                *existing = descriptor;
            }
            None => self.descriptors.push(descriptor),
        }
        self
    }

    pub fn extend(self, descriptors: impl IntoIterator<Item = AdapterDescriptor>) -> Self {
        descriptors.into_iter().fold(self, Self::add)
    }

    /// Mark every adapter with this id as disabled.
    pub fn disable(mut self, id: impl Into<String>) -> Self {
        self.disabled.insert(id.into());
        self
    }

    pub fn build(self) -> CapabilityRegistry {
        let mut engines = Vec::new();
        let mut players = Vec::new();
        let mut transcoders = Vec::new();

        for mut descriptor in self.descriptors {
            if self.disabled.contains(descriptor.id()) {
                descriptor.set_enabled(false);
            }
            match descriptor {
                AdapterDescriptor::Engine(e) => engines.push(e),
                AdapterDescriptor::Player(p) => players.push(p),
                AdapterDescriptor::Transcoder(t) => transcoders.push(t),
            }
        }

        // Stable: equal ranks keep registration order.
        players.sort_by_key(|p: &PlayerInfo| p.rank);

        log::debug!(
            "capability registry: {} engine(s), {} player(s), {} transcoder(s)",
            engines.len(),
            players.len(),
            transcoders.len()
        );

        CapabilityRegistry {
            engines,
            players,
            transcoders,
        }
    }
}

// ---------------------------------------------------------------------------
// CapabilityRegistry
// ---------------------------------------------------------------------------

/// Declarative description of every registered engine, player and
/// transcoder.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    engines: Vec<EngineInfo>,
    /// Sorted by rank: this is registry preference order.
    players: Vec<PlayerInfo>,
    transcoders: Vec<TranscoderInfo>,
}

impl CapabilityRegistry {
    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn engine(&self, id: &str) -> Option<&EngineInfo> {
        self.engines.iter().find(|e| e.id == id)
    }

    pub fn player(&self, id: &str) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn transcoder(&self, id: &str) -> Option<&TranscoderInfo> {
        self.transcoders.iter().find(|t| t.id == id)
    }

    pub fn engines(&self) -> impl Iterator<Item = &EngineInfo> {
        self.engines.iter()
    }

    /// All players in registry preference order, disabled ones included.
    pub fn players(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.players.iter()
    }

    pub fn enabled_players(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.players.iter().filter(|p| p.enabled)
    }

    pub fn enabled_transcoders(&self) -> impl Iterator<Item = &TranscoderInfo> {
        self.transcoders.iter().filter(|t| t.enabled)
    }

    /// The engine's declared default player, if registered and enabled.
    pub fn default_player(&self, engine_id: &str) -> Option<&PlayerInfo> {
        self.engine(engine_id)?
            .default_player
            .as_deref()
            .and_then(|id| self.player(id))
            .filter(|p| p.enabled)
    }

    pub fn output_formats(&self, engine_id: &str) -> Vec<AudioType> {
        self.engine(engine_id)
            .map(|e| e.output_formats.clone())
            .unwrap_or_default()
    }

    pub fn input_formats(&self, player_id: &str) -> Vec<AudioType> {
        self.player(player_id)
            .map(|p| p.input_formats.clone())
            .unwrap_or_default()
    }

    // -----------------------------------------------------------------------
    // Settings schema
    // -----------------------------------------------------------------------

    /// Whether `setting` is a known setting of the engine or player `service`.
    pub fn is_valid_setting(&self, service: &str, setting: &str) -> bool {
        self.validator(service, setting).is_some()
    }

    /// Validator for `setting` of the engine or player `service`.
    ///
    /// Engines are looked up before players. Resolver-managed settings
    /// (`player`, `player_mode`, `cache_speech`, `audio_type`,
    /// `transcoder`) are derived from the declared capabilities; anything
    /// else comes from the adapter's own settings schema.
    pub fn validator(&self, service: &str, setting: &str) -> Option<Validator> {
        if let Some(engine) = self.engine(service) {
            return self.engine_validator(engine, setting);
        }
        let player = self.player(service)?;
        player_validator(player, setting)
    }

    fn engine_validator(&self, engine: &EngineInfo, setting: &str) -> Option<Validator> {
        match setting {
            keys::PLAYER => {
                let allowed: Vec<(SettingValue, bool)> = self
                    .players
                    .iter()
                    .filter(|p| {
                        p.player_modes
                            .iter()
                            .any(|m| m.uses_player() && engine.supports_mode(*m))
                    })
                    .map(|p| (SettingValue::from(p.id.as_str()), p.enabled))
                    .collect();
                let default = self
                    .default_player(&engine.id)
                    .map(|p| p.id.clone())
                    .or_else(|| {
                        allowed
                            .iter()
                            .find(|(_, enabled)| *enabled)
                            .and_then(|(v, _)| v.as_str().map(str::to_string))
                    })?;
                (!allowed.is_empty()).then(|| Validator::enumerated(default, allowed))
            }
            keys::PLAYER_MODE => {
                let default = engine.default_mode()?;
                Some(mode_validator(default, &engine.player_modes))
            }
            keys::CACHE_SPEECH => Some(cache_validator(engine.supports_cache)),
            keys::AUDIO_TYPE => {
                let default = AudioType::PREFERENCE
                    .into_iter()
                    .find(|a| engine.produces(*a))
                    .or_else(|| engine.output_formats.first().copied())?;
                Some(audio_validator(default, &engine.output_formats))
            }
            keys::TRANSCODER => {
                let allowed: Vec<(SettingValue, bool)> = self
                    .transcoders
                    .iter()
                    .filter(|t| engine.produces(t.input))
                    .map(|t| (SettingValue::from(t.id.as_str()), t.enabled))
                    .collect();
                let default = allowed.first()?.0.clone();
                Some(Validator::enumerated(default, allowed))
            }
            other => schema_validator(&engine.settings, other),
        }
    }
}

fn player_validator(player: &PlayerInfo, setting: &str) -> Option<Validator> {
    match setting {
        keys::PLAYER_MODE => {
            let default = *player.player_modes.first()?;
            Some(mode_validator(default, &player.player_modes))
        }
        keys::CACHE_SPEECH => Some(cache_validator(player.supports_cache)),
        keys::AUDIO_TYPE => {
            let default = *player.input_formats.first()?;
            Some(audio_validator(default, &player.input_formats))
        }
        other => schema_validator(&player.settings, other),
    }
}

fn mode_validator(default: PlayerMode, modes: &[PlayerMode]) -> Validator {
    Validator::enumerated(
        default.as_str(),
        modes.iter().map(|m| (m.as_str().into(), true)).collect(),
    )
}

fn audio_validator(default: AudioType, formats: &[AudioType]) -> Validator {
    Validator::enumerated(
        default.as_str(),
        formats.iter().map(|a| (a.as_str().into(), true)).collect(),
    )
}

fn cache_validator(supported: bool) -> Validator {
    Validator::enumerated(
        supported,
        vec![(true.into(), supported), (false.into(), true)],
    )
}

fn schema_validator(schema: &[SettingSpec], setting: &str) -> Option<Validator> {
    let spec = schema.iter().find(|s| s.name == setting)?;
    if spec.allowed.is_empty() {
        return Some(Validator::open(spec.default.clone()));
    }
    let allowed = spec
        .allowed
        .iter()
        .map(|v| (v.clone(), !spec.disabled.contains(v)))
        .collect();
    Some(Validator::enumerated(spec.default.clone(), allowed))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::builtin_descriptors;

    fn builtin() -> CapabilityRegistry {
        RegistryBuilder::new().extend(builtin_descriptors()).build()
    }

    #[test]
    fn players_are_in_rank_order() {
        let reg = builtin();
        let ranks: Vec<u32> = reg.players().map(|p| p.rank).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
        assert_eq!(reg.players().next().map(|p| p.id.as_str()), Some("mpv"));
    }

    #[test]
    fn unknown_keys_are_absent_not_errors() {
        let reg = builtin();
        assert!(reg.output_formats("nope").is_empty());
        assert!(reg.input_formats("nope").is_empty());
        assert!(!reg.is_valid_setting("nope", keys::PLAYER));
        assert!(!reg.is_valid_setting("espeak", "pitch_bend"));
        assert!(reg.default_player("nope").is_none());
    }

    #[test]
    fn later_descriptor_replaces_earlier_in_place() {
        let mut mpv = match builtin_descriptors()
            .into_iter()
            .find(|d| d.id() == "mpv")
        {
            Some(AdapterDescriptor::Player(p)) => p,
            _ => panic!("mpv is built in"),
        };
        mpv.input_formats = vec![AudioType::Wav];

        let reg = RegistryBuilder::new()
            .extend(builtin_descriptors())
            .add(AdapterDescriptor::Player(mpv))
            .build();

        assert_eq!(reg.players().filter(|p| p.id == "mpv").count(), 1);
        assert_eq!(reg.input_formats("mpv"), vec![AudioType::Wav]);
    }

    #[test]
    fn disabled_default_player_is_not_reported() {
        let reg = RegistryBuilder::new()
            .extend(builtin_descriptors())
            .disable("mpv")
            .build();
        assert!(reg.default_player("espeak").is_none());
        assert_eq!(reg.enabled_players().count(), reg.players().count() - 1);
    }

    #[test]
    fn engine_player_validator_lists_compatible_players() {
        let reg = RegistryBuilder::new()
            .extend(builtin_descriptors())
            .disable("aplay")
            .build();
        let v = reg.validator("pico2wave", keys::PLAYER).expect("validator");

        assert_eq!(v.default_value(), &SettingValue::from("mpv"));
        assert!(v.is_value_valid(&"sfx".into()));
        // Disabled players are listed but not valid.
        assert!(!v.is_value_valid(&"aplay".into()));
        assert!(v
            .allowed_values(false)
            .contains(&(SettingValue::from("aplay"), false)));
    }

    #[test]
    fn self_voicing_only_engine_has_no_player_setting() {
        let reg = builtin();
        assert!(!reg.is_valid_setting("speech_dispatcher", keys::PLAYER));
        assert!(reg.is_valid_setting("speech_dispatcher", keys::PLAYER_MODE));
        assert!(!reg.is_valid_setting("speech_dispatcher", keys::AUDIO_TYPE));
    }

    #[test]
    fn cache_validator_follows_capability() {
        let reg = builtin();
        let engine_cache = reg.validator("espeak", keys::CACHE_SPEECH).expect("validator");
        assert!(engine_cache.is_value_valid(&true.into()));

        let player_cache = reg.validator("aplay", keys::CACHE_SPEECH).expect("validator");
        assert!(!player_cache.is_value_valid(&true.into()));
        assert!(player_cache.is_value_valid(&false.into()));
    }

    #[test]
    fn schema_settings_are_exposed() {
        let reg = builtin();
        assert!(reg.is_valid_setting("espeak", "voice"));
        let gender = reg.validator("google", "gender").expect("validator");
        assert!(gender.is_value_valid(&"male".into()));
        assert!(!gender.is_value_valid(&"robot".into()));
    }

    #[test]
    fn transcoder_setting_requires_matching_input() {
        let reg = builtin();
        assert!(reg.is_valid_setting("espeak", keys::TRANSCODER));
        // google only produces MP3; every built-in transcoder reads WAV.
        assert!(!reg.is_valid_setting("google", keys::TRANSCODER));
    }
}
