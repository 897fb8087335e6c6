//! Audio formats and player transports.
//!
//! Both enums are stored in the settings stack as their lowercase string
//! form (`"mp3"`, `"slave_file"` …) so they round-trip through TOML.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ParseEnumError
// ---------------------------------------------------------------------------

/// Returned by `FromStr` when a stored string names no known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

// ---------------------------------------------------------------------------
// AudioType
// ---------------------------------------------------------------------------

/// Audio container produced by an engine or accepted by a player.
///
/// Ordering between variants carries no meaning; use
/// [`AudioType::PREFERENCE`] when a preference is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioType {
    /// No audio leaves the engine (self-voicing).
    None,
    /// Uncompressed PCM in a RIFF container.
    Wav,
    /// MPEG layer III.
    Mp3,
}

impl AudioType {
    /// Formats in order of preference when audio is cached.
    ///
    /// MP3 comes first: cached WAV files are large.
    pub const PREFERENCE: [AudioType; 2] = [AudioType::Mp3, AudioType::Wav];

    /// Whether caching this format is worthwhile without an explicit request.
    pub fn is_cache_friendly(self) -> bool {
        self == AudioType::Mp3
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioType::None => "none",
            AudioType::Wav => "wav",
            AudioType::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for AudioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(AudioType::None),
            "wav" => Ok(AudioType::Wav),
            "mp3" => Ok(AudioType::Mp3),
            _ => Err(ParseEnumError {
                kind: "audio type",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerMode
// ---------------------------------------------------------------------------

/// Transport contract between an engine and a player.
///
/// | Variant      | Flow                                             |
/// |--------------|--------------------------------------------------|
/// | EngineSpeak  | engine renders audio itself, no player involved  |
/// | File         | engine writes a file, player is launched on it   |
/// | SlaveFile    | long-running player is fed file paths            |
/// | Pipe         | engine output is streamed into the player        |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerMode {
    EngineSpeak,
    File,
    SlaveFile,
    Pipe,
}

impl PlayerMode {
    /// Every mode that routes audio through a player.
    pub const PLAYER_MODES: [PlayerMode; 3] =
        [PlayerMode::SlaveFile, PlayerMode::File, PlayerMode::Pipe];

    /// `true` for every mode except [`PlayerMode::EngineSpeak`].
    pub fn uses_player(self) -> bool {
        self != PlayerMode::EngineSpeak
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerMode::EngineSpeak => "engine_speak",
            PlayerMode::File => "file",
            PlayerMode::SlaveFile => "slave_file",
            PlayerMode::Pipe => "pipe",
        }
    }
}

impl fmt::Display for PlayerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayerMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "engine_speak" => Ok(PlayerMode::EngineSpeak),
            "file" => Ok(PlayerMode::File),
            "slave_file" => Ok(PlayerMode::SlaveFile),
            "pipe" => Ok(PlayerMode::Pipe),
            _ => Err(ParseEnumError {
                kind: "player mode",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_type_parses_case_insensitively() {
        assert_eq!("MP3".parse::<AudioType>(), Ok(AudioType::Mp3));
        assert_eq!(" wav ".parse::<AudioType>(), Ok(AudioType::Wav));
        assert!("ogg".parse::<AudioType>().is_err());
    }

    #[test]
    fn player_mode_display_matches_parse() {
        for mode in [
            PlayerMode::EngineSpeak,
            PlayerMode::File,
            PlayerMode::SlaveFile,
            PlayerMode::Pipe,
        ] {
            assert_eq!(mode.to_string().parse::<PlayerMode>(), Ok(mode));
        }
    }

    #[test]
    fn only_mp3_is_cache_friendly() {
        assert!(AudioType::Mp3.is_cache_friendly());
        assert!(!AudioType::Wav.is_cache_friendly());
        assert!(!AudioType::None.is_cache_friendly());
    }

    #[test]
    fn engine_speak_does_not_use_player() {
        assert!(!PlayerMode::EngineSpeak.uses_player());
        assert!(PlayerMode::PLAYER_MODES.iter().all(|m| m.uses_player()));
    }

    #[test]
    fn parse_error_names_the_kind() {
        let err = "tape".parse::<PlayerMode>().unwrap_err();
        assert_eq!(err.to_string(), "unknown player mode: \"tape\"");
    }
}
