//! Adapter descriptors: the static capability declarations the registry is
//! built from.
//!
//! Descriptors come from two places:
//! - [`builtin_descriptors`]: the adapters shipped with the crate.
//! - [`load_descriptors`]: an optional `capabilities.toml` (or `.json`)
//!   that adds adapters or overrides built-ins with the same id.
//!
//! # File format
//!
//! ```toml
//! [[adapter]]
//! kind = "engine"
//! id = "piper"
//! output_formats = ["wav"]
//! player_modes = ["slave_file", "file", "pipe"]
//! default_player = "mpv"
//! supports_cache = true
//!
//! [[adapter]]
//! kind = "transcoder"
//! id = "lame"
//! input = "wav"
//! output = "mp3"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{AudioType, PlayerMode};
use crate::settings::SettingValue;

/// Registry position given to players that declare no rank.
pub const DEFAULT_RANK: u32 = 100;

fn enabled_by_default() -> bool {
    true
}

fn default_rank() -> u32 {
    DEFAULT_RANK
}

// ---------------------------------------------------------------------------
// CapabilityError
// ---------------------------------------------------------------------------

/// Errors raised while reading descriptor files.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("cannot read descriptor file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML descriptor file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON descriptor file: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported descriptor file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

// ---------------------------------------------------------------------------
// SettingSpec
// ---------------------------------------------------------------------------

/// One adapter-specific setting (voice, speed, …) beyond the ones the
/// resolver manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingSpec {
    pub name: String,
    pub default: SettingValue,
    /// Enumerated values; empty means any value of the default's kind.
    #[serde(default)]
    pub allowed: Vec<SettingValue>,
    /// Members of `allowed` that are currently unavailable.
    #[serde(default)]
    pub disabled: Vec<SettingValue>,
}

impl SettingSpec {
    pub fn open(name: &str, default: impl Into<SettingValue>) -> Self {
        Self {
            name: name.to_string(),
            default: default.into(),
            allowed: Vec::new(),
            disabled: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineInfo / PlayerInfo / TranscoderInfo
// ---------------------------------------------------------------------------

/// Declared capabilities of a speech-synthesis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineInfo {
    pub id: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Formats the engine can write, in the engine's own preference order.
    #[serde(default)]
    pub output_formats: Vec<AudioType>,
    /// Supported transports in priority order.
    pub player_modes: Vec<PlayerMode>,
    /// Falls back to the first entry of `player_modes` when unset.
    #[serde(default)]
    pub default_mode: Option<PlayerMode>,
    #[serde(default)]
    pub default_player: Option<String>,
    /// Whether produced audio may be kept in the content cache.
    #[serde(default)]
    pub supports_cache: bool,
    #[serde(default)]
    pub settings: Vec<SettingSpec>,
}

impl EngineInfo {
    pub fn default_mode(&self) -> Option<PlayerMode> {
        self.default_mode
            .filter(|m| self.player_modes.contains(m))
            .or_else(|| self.player_modes.first().copied())
    }

    /// The engine can render audio without a player.
    pub fn is_self_voicing(&self) -> bool {
        self.supports_mode(PlayerMode::EngineSpeak)
    }

    pub fn supports_mode(&self, mode: PlayerMode) -> bool {
        self.player_modes.contains(&mode)
    }

    pub fn produces(&self, audio: AudioType) -> bool {
        self.output_formats.contains(&audio)
    }
}

/// Declared capabilities of an audio player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub input_formats: Vec<AudioType>,
    pub player_modes: Vec<PlayerMode>,
    /// Whether the player can play from the content cache.
    #[serde(default)]
    pub supports_cache: bool,
    /// Lower ranks come first in registry order.
    #[serde(default = "default_rank")]
    pub rank: u32,
    #[serde(default)]
    pub settings: Vec<SettingSpec>,
}

impl PlayerInfo {
    pub fn accepts(&self, audio: AudioType) -> bool {
        self.input_formats.contains(&audio)
    }

    pub fn supports_mode(&self, mode: PlayerMode) -> bool {
        self.player_modes.contains(&mode)
    }
}

/// A format converter placed between engine and player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscoderInfo {
    pub id: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub input: AudioType,
    pub output: AudioType,
}

// ---------------------------------------------------------------------------
// AdapterDescriptor
// ---------------------------------------------------------------------------

/// Tagged declaration of one adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterDescriptor {
    Engine(EngineInfo),
    Player(PlayerInfo),
    Transcoder(TranscoderInfo),
}

impl AdapterDescriptor {
    pub fn id(&self) -> &str {
        match self {
            AdapterDescriptor::Engine(e) => &e.id,
            AdapterDescriptor::Player(p) => &p.id,
            AdapterDescriptor::Transcoder(t) => &t.id,
        }
    }

    /// `true` when both describe the same kind of adapter with the same id.
    pub fn same_adapter(&self, other: &AdapterDescriptor) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other) && self.id() == other.id()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            AdapterDescriptor::Engine(e) => e.enabled = enabled,
            AdapterDescriptor::Player(p) => p.enabled = enabled,
            AdapterDescriptor::Transcoder(t) => t.enabled = enabled,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DescriptorFile {
    #[serde(default, rename = "adapter")]
    adapters: Vec<AdapterDescriptor>,
}

/// Read descriptors from a `.toml` or `.json` file.
pub fn load_descriptors(path: &Path) -> Result<Vec<AdapterDescriptor>, CapabilityError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let file: DescriptorFile = match extension.as_deref() {
        Some("toml") => toml::from_str(&std::fs::read_to_string(path)?)?,
        Some("json") => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        _ => return Err(CapabilityError::UnsupportedFormat(path.to_path_buf())),
    };

    log::debug!(
        "loaded {} adapter descriptor(s) from {}",
        file.adapters.len(),
        path.display()
    );
    Ok(file.adapters)
}

// ---------------------------------------------------------------------------
// Built-in adapters
// ---------------------------------------------------------------------------

fn engine(
    id: &str,
    output_formats: &[AudioType],
    player_modes: &[PlayerMode],
    default_player: Option<&str>,
) -> EngineInfo {
    EngineInfo {
        id: id.to_string(),
        enabled: true,
        output_formats: output_formats.to_vec(),
        player_modes: player_modes.to_vec(),
        default_mode: None,
        default_player: default_player.map(str::to_string),
        supports_cache: !output_formats.is_empty(),
        settings: Vec::new(),
    }
}

fn player(
    id: &str,
    input_formats: &[AudioType],
    player_modes: &[PlayerMode],
    supports_cache: bool,
    rank: u32,
) -> PlayerInfo {
    PlayerInfo {
        id: id.to_string(),
        enabled: true,
        input_formats: input_formats.to_vec(),
        player_modes: player_modes.to_vec(),
        supports_cache,
        rank,
        settings: Vec::new(),
    }
}

fn transcoder(id: &str, input: AudioType, output: AudioType) -> TranscoderInfo {
    TranscoderInfo {
        id: id.to_string(),
        enabled: true,
        input,
        output,
    }
}

/// Adapters known to the crate, in registration order.
pub fn builtin_descriptors() -> Vec<AdapterDescriptor> {
    use AudioType::{Mp3, Wav};
    use PlayerMode::{EngineSpeak, File, Pipe, SlaveFile};

    let mut espeak = engine(
        "espeak",
        &[Wav],
        &[EngineSpeak, SlaveFile, File, Pipe],
        Some("mpv"),
    );
    espeak.settings = vec![
        SettingSpec::open("voice", "en"),
        SettingSpec::open("speed", 175_i64),
    ];

    let mut piper = engine("piper", &[Wav], &[SlaveFile, File, Pipe], Some("mpv"));
    piper.settings = vec![SettingSpec::open("voice", "en_US-lessac-medium")];

    let mut google = engine("google", &[Mp3], &[SlaveFile, File], Some("mpv"));
    google.settings = vec![SettingSpec {
        name: "gender".to_string(),
        default: "female".into(),
        allowed: vec!["female".into(), "male".into()],
        disabled: Vec::new(),
    }];

    vec![
        AdapterDescriptor::Engine(espeak),
        AdapterDescriptor::Engine(piper),
        AdapterDescriptor::Engine(engine("pico2wave", &[Wav], &[File], Some("mpv"))),
        AdapterDescriptor::Engine(engine("festival", &[Wav], &[File, Pipe], None)),
        AdapterDescriptor::Engine(google),
        AdapterDescriptor::Engine(engine("speech_dispatcher", &[], &[EngineSpeak], None)),
        AdapterDescriptor::Player(player("mpv", &[Wav, Mp3], &[SlaveFile, File, Pipe], true, 10)),
        AdapterDescriptor::Player(player("mplayer", &[Wav, Mp3], &[SlaveFile, File], true, 20)),
        AdapterDescriptor::Player(player("aplay", &[Wav], &[File, Pipe], false, 30)),
        AdapterDescriptor::Player(player("paplay", &[Wav], &[File, Pipe], false, 40)),
        AdapterDescriptor::Player(player("sfx", &[Wav], &[File], false, 50)),
        AdapterDescriptor::Transcoder(transcoder("lame", Wav, Mp3)),
        AdapterDescriptor::Transcoder(transcoder("ffmpeg", Wav, Mp3)),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
