//! A single layer of the settings stack.

use std::time::Instant;

use super::value::{SettingValue, SettingsMap};

/// One copy-on-write layer: a full snapshot of the frame below it at
/// creation time, modified independently afterwards.
#[derive(Debug, Clone)]
pub struct SettingsFrame {
    values: SettingsMap,
    changed: bool,
    created_at: Instant,
}

impl SettingsFrame {
    pub fn new(values: SettingsMap) -> Self {
        Self {
            values,
            changed: false,
            created_at: Instant::now(),
        }
    }

    /// A fresh, unchanged frame holding a copy of this frame's values.
    pub fn snapshot(&self) -> Self {
        Self::new(self.values.clone())
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    /// Store `value` under `key`; returns `true` if the stored value changed.
    pub fn set(&mut self, key: &str, value: SettingValue) -> bool {
        if self.values.get(key) == Some(&value) {
            return false;
        }
        self.values.insert(key.to_string(), value);
        self.changed = true;
        true
    }

    /// Remove `key`; returns `true` if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.values.remove(key).is_some();
        self.changed |= removed;
        removed
    }

    /// Replace every value with `values` (used when a higher frame is
    /// flattened into this one).
    pub fn replace(&mut self, values: SettingsMap) {
        if self.values != values {
            self.values = values;
            self.changed = true;
        }
    }

    pub fn values(&self) -> &SettingsMap {
        &self.values
    }

    pub fn into_values(self) -> SettingsMap {
        self.values
    }

    /// Whether any write has modified this frame since it was created or
    /// last marked clean.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn mark_clean(&mut self) {
        self.changed = false;
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_reports_change_only_for_new_values() {
        let mut frame = SettingsFrame::new(SettingsMap::new());
        assert!(frame.set("engine", "espeak".into()));
        assert!(!frame.set("engine", "espeak".into()));
        assert!(frame.set("engine", "piper".into()));
        assert!(frame.is_changed());
    }

    #[test]
    fn snapshot_is_independent_and_clean() {
        let mut base = SettingsFrame::new(SettingsMap::new());
        base.set("engine", "espeak".into());

        let mut top = base.snapshot();
        assert!(!top.is_changed());
        top.set("engine", "piper".into());

        assert_eq!(base.get("engine"), Some(&SettingValue::from("espeak")));
        assert_eq!(top.get("engine"), Some(&SettingValue::from("piper")));
        assert!(top.created_at() >= base.created_at());
    }

    #[test]
    fn remove_missing_key_is_not_a_change() {
        let mut frame = SettingsFrame::new(SettingsMap::new());
        assert!(!frame.remove("engine"));
        assert!(!frame.is_changed());
    }

    #[test]
    fn replace_with_identical_values_stays_clean() {
        let mut values = SettingsMap::new();
        values.insert("engine".into(), "espeak".into());
        let mut frame = SettingsFrame::new(values.clone());
        frame.replace(values);
        assert!(!frame.is_changed());
    }
}
