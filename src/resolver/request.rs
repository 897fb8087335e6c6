//! Caller wishes passed to the resolver.

use crate::capability::{AudioType, PlayerMode};

use super::engine_config::EngineConfig;

/// What the caller wants for an engine. Every `Some` field is a forced
/// value; it is honoured only when compatible with the engine.
///
/// ```
/// use voice_pipeline_config::capability::PlayerMode;
/// use voice_pipeline_config::resolver::ResolveRequest;
///
/// let request = ResolveRequest::new("piper")
///     .with_player("aplay")
///     .with_player_mode(PlayerMode::Pipe);
/// assert!(!request.repair);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveRequest {
    pub engine_id: String,
    pub player: Option<String>,
    pub audio_type: Option<AudioType>,
    pub player_mode: Option<PlayerMode>,
    pub use_cache: Option<bool>,
    /// This is a healing pass over previously stored values.
    pub repair: bool,
}

impl ResolveRequest {
    pub fn new(engine_id: impl Into<String>) -> Self {
        Self {
            engine_id: engine_id.into(),
            ..Self::default()
        }
    }

    /// Repair request re-stating every choice of an existing config.
    pub fn repairing(config: &EngineConfig) -> Self {
        Self {
            engine_id: config.engine_id.clone(),
            player: config.player_id.clone(),
            audio_type: config.player_id.as_ref().map(|_| config.engine_audio),
            player_mode: Some(config.player_mode),
            use_cache: config.player_id.as_ref().map(|_| config.use_cache),
            repair: true,
        }
    }

    pub fn with_player(mut self, player: impl Into<String>) -> Self {
        self.player = Some(player.into());
        self
    }

    pub fn with_audio_type(mut self, audio_type: AudioType) -> Self {
        self.audio_type = Some(audio_type);
        self
    }

    pub fn with_player_mode(mut self, mode: PlayerMode) -> Self {
        self.player_mode = Some(mode);
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = Some(use_cache);
        self
    }

    pub fn in_repair_mode(mut self) -> Self {
        self.repair = true;
        self
    }
}
