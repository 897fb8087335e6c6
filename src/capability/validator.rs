//! Per-setting validators handed out by the registry.

use std::mem::discriminant;

use crate::settings::SettingValue;

/// Describes the legal values of one setting of one engine or player.
///
/// A validator with no enumerated values is *open*: any value of the same
/// kind as the default is accepted (e.g. a numeric speed).
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    default: SettingValue,
    allowed: Vec<(SettingValue, bool)>,
}

impl Validator {
    /// Open validator that only checks the value kind.
    pub fn open(default: impl Into<SettingValue>) -> Self {
        Self {
            default: default.into(),
            allowed: Vec::new(),
        }
    }

    /// Enumerated validator; `allowed` is `(value, enabled)` in preference order.
    pub fn enumerated(default: impl Into<SettingValue>, allowed: Vec<(SettingValue, bool)>) -> Self {
        Self {
            default: default.into(),
            allowed,
        }
    }

    pub fn default_value(&self) -> &SettingValue {
        &self.default
    }

    /// Enumerated values in declared order.
    ///
    /// With `enabled_only` set, disabled entries are skipped. Open validators
    /// return an empty list.
    pub fn allowed_values(&self, enabled_only: bool) -> Vec<(SettingValue, bool)> {
        self.allowed
            .iter()
            .filter(|(_, enabled)| !enabled_only || *enabled)
            .cloned()
            .collect()
    }

    /// `true` when `value` is an enabled enumerated value, or matches the
    /// default's kind for an open validator.
    pub fn is_value_valid(&self, value: &SettingValue) -> bool {
        if self.allowed.is_empty() {
            return discriminant(value) == discriminant(&self.default);
        }
        self.allowed
            .iter()
            .any(|(allowed, enabled)| *enabled && allowed == value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
