//! Setting values and the flat key/value map stored in each frame.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat `key → value` map held by a frame and by the persistent store.
///
/// A `BTreeMap` keeps `settings.toml` output sorted and stable.
pub type SettingsMap = BTreeMap<String, SettingValue>;

// ---------------------------------------------------------------------------
// SettingValue
// ---------------------------------------------------------------------------

/// A single stored setting.
///
/// Untagged so that TOML stores plain scalars (`player = "mpv"`,
/// `cache_speech = true`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl SettingValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            SettingValue::Float(f) => Some(*f),
            SettingValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Int(i) => write!(f, "{i}"),
            SettingValue::Float(x) => write!(f, "{x}"),
            SettingValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        SettingValue::Int(i)
    }
}

impl From<f64> for SettingValue {
    fn from(x: f64) -> Self {
        SettingValue::Float(x)
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Str(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Str(s)
    }
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Setting names used by the resolver.
///
/// Per-adapter settings are stored under `"<service>.<setting>"`; see
/// [`service_key`].
pub mod keys {
    /// Global key holding the active engine id.
    pub const ENGINE: &str = "engine";
    pub const PLAYER: &str = "player";
    pub const PLAYER_MODE: &str = "player_mode";
    pub const AUDIO_TYPE: &str = "audio_type";
    pub const CACHE_SPEECH: &str = "cache_speech";
    pub const TRANSCODER: &str = "transcoder";

    /// Build the stack key for a setting that belongs to one adapter.
    ///
    /// ```
    /// use voice_pipeline_config::settings::keys;
    ///
    /// assert_eq!(keys::service_key("espeak", keys::PLAYER), "espeak.player");
    /// ```
    pub fn service_key(service: &str, setting: &str) -> String {
        format!("{service}.{setting}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
