//! Typed key-value store shared by all nodes of one tree.
//!
//! Keys are created once per value kind and afterwards only updated. Reads of
//! unknown keys fall back to the kind's zero value; writes to unknown keys
//! leave the store untouched and report [`BlackboardError::UnknownKey`].
//!
//! Every successful write raises a dirty flag. The owning tree clears it once
//! per tick after the root returns, so every composite ticked within one frame
//! sees the same "something changed" signal.

use std::collections::HashMap;

use crate::error::{BlackboardError, ValueKind};

const DEFAULT_NAME: &str = "DefaultBlackboard";

#[derive(Debug, Clone, PartialEq)]
pub struct Blackboard {
    name: String,
    bools: HashMap<String, bool>,
    ints: HashMap<String, i32>,
    floats: HashMap<String, f32>,
    strings: HashMap<String, String>,
    values_changed: bool,
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new(DEFAULT_NAME)
    }
}

impl Blackboard {
    /// Creates an empty blackboard.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bools: HashMap::new(),
            ints: HashMap::new(),
            floats: HashMap::new(),
            strings: HashMap::new(),
            values_changed: false,
        }
    }

    /// Class name, persisted by tree documents.
    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== creation =====
    //
    // Creating an existing key overwrites its value. Creation does not mark
    // the blackboard dirty.

    /// Inserts a bool key.
    pub fn create_bool(&mut self, key: impl Into<String>, value: bool) {
        self.bools.insert(key.into(), value);
    }

    /// Inserts an int key.
    pub fn create_int(&mut self, key: impl Into<String>, value: i32) {
        self.ints.insert(key.into(), value);
    }

    /// Inserts a float key.
    pub fn create_float(&mut self, key: impl Into<String>, value: f32) {
        self.floats.insert(key.into(), value);
    }

    /// Inserts a string key.
    pub fn create_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }

    /// Chaining form of [`create_bool`](Self::create_bool).
    #[must_use]
    pub fn with_bool(mut self, key: impl Into<String>, value: bool) -> Self {
        self.create_bool(key, value);
        self
    }

    /// Chaining form of [`create_int`](Self::create_int).
    #[must_use]
    pub fn with_int(mut self, key: impl Into<String>, value: i32) -> Self {
        self.create_int(key, value);
        self
    }

    /// Chaining form of [`create_float`](Self::create_float).
    #[must_use]
    pub fn with_float(mut self, key: impl Into<String>, value: f32) -> Self {
        self.create_float(key, value);
        self
    }

    /// Chaining form of [`create_string`](Self::create_string).
    #[must_use]
    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.create_string(key, value);
        self
    }

    // ===== reads =====

    /// Value of a bool key, `false` when missing.
    pub fn bool_value(&self, key: &str) -> bool {
        self.bools.get(key).copied().unwrap_or(false)
    }

    /// Value of an int key, `0` when missing.
    pub fn int_value(&self, key: &str) -> i32 {
        self.ints.get(key).copied().unwrap_or(0)
    }

    /// Value of a float key, `0.0` when missing.
    pub fn float_value(&self, key: &str) -> f32 {
        self.floats.get(key).copied().unwrap_or(0.0)
    }

    /// Value of a string key, empty when missing.
    pub fn string_value(&self, key: &str) -> &str {
        self.strings.get(key).map(String::as_str).unwrap_or("")
    }

    /// Whether a bool key was created.
    pub fn has_bool(&self, key: &str) -> bool {
        self.bools.contains_key(key)
    }

    /// Whether an int key was created.
    pub fn has_int(&self, key: &str) -> bool {
        self.ints.contains_key(key)
    }

    /// Whether a float key was created.
    pub fn has_float(&self, key: &str) -> bool {
        self.floats.contains_key(key)
    }

    /// Whether a string key was created.
    pub fn has_string(&self, key: &str) -> bool {
        self.strings.contains_key(key)
    }

    /// All bool entries.
    pub fn bool_values(&self) -> &HashMap<String, bool> {
        &self.bools
    }

    /// All int entries.
    pub fn int_values(&self) -> &HashMap<String, i32> {
        &self.ints
    }

    /// All float entries.
    pub fn float_values(&self) -> &HashMap<String, f32> {
        &self.floats
    }

    /// All string entries.
    pub fn string_values(&self) -> &HashMap<String, String> {
        &self.strings
    }

    // ===== writes =====

    /// Updates an existing bool key and marks the blackboard changed.
    pub fn set_bool(&mut self, key: &str, value: bool) -> Result<(), BlackboardError> {
        let slot = self
            .bools
            .get_mut(key)
            .ok_or_else(|| unknown(ValueKind::Bool, key))?;
        *slot = value;
        self.values_changed = true;
        Ok(())
    }

    /// Updates an existing int key and marks the blackboard changed.
    pub fn set_int(&mut self, key: &str, value: i32) -> Result<(), BlackboardError> {
        let slot = self
            .ints
            .get_mut(key)
            .ok_or_else(|| unknown(ValueKind::Int, key))?;
        *slot = value;
        self.values_changed = true;
        Ok(())
    }

    /// Updates an existing float key and marks the blackboard changed.
    pub fn set_float(&mut self, key: &str, value: f32) -> Result<(), BlackboardError> {
        let slot = self
            .floats
            .get_mut(key)
            .ok_or_else(|| unknown(ValueKind::Float, key))?;
        *slot = value;
        self.values_changed = true;
        Ok(())
    }

    /// Updates an existing string key and marks the blackboard changed.
    pub fn set_string(
        &mut self,
        key: &str,
        value: impl Into<String>,
    ) -> Result<(), BlackboardError> {
        let slot = self
            .strings
            .get_mut(key)
            .ok_or_else(|| unknown(ValueKind::String, key))?;
        *slot = value.into();
        self.values_changed = true;
        Ok(())
    }

    // ===== dirty flag =====

    /// Whether any value was written since the flag was last cleared.
    pub fn is_values_changed(&self) -> bool {
        self.values_changed
    }

    /// Called by the owning tree after every tick.
    pub fn clear_values_changed_flag(&mut self) {
        self.values_changed = false;
    }
}

fn unknown(kind: ValueKind, key: &str) -> BlackboardError {
    BlackboardError::UnknownKey {
        kind,
        key: key.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_read_as_zero_values() {
        let bb = Blackboard::default();
        assert!(!bb.bool_value("missing"));
        assert_eq!(bb.int_value("missing"), 0);
        assert_eq!(bb.float_value("missing"), 0.0);
        assert_eq!(bb.string_value("missing"), "");
    }

    #[test]
    fn set_updates_existing_key_and_marks_dirty() {
        let mut bb = Blackboard::default().with_float("Stamina", 50.0);
        assert!(!bb.is_values_changed());

        bb.set_float("Stamina", 20.0).unwrap();
        assert_eq!(bb.float_value("Stamina"), 20.0);
        assert!(bb.is_values_changed());

        bb.clear_values_changed_flag();
        assert!(!bb.is_values_changed());
    }

    #[test]
    fn set_on_unknown_key_changes_nothing() {
        let mut bb = Blackboard::default();
        let err = bb.set_int("AttackPower", 10).unwrap_err();

        assert_eq!(
            err,
            BlackboardError::UnknownKey {
                kind: ValueKind::Int,
                key: "AttackPower".into()
            }
        );
        assert!(!bb.has_int("AttackPower"));
        assert_eq!(bb.int_value("AttackPower"), 0);
        assert!(!bb.is_values_changed());
    }

    #[test]
    fn kinds_are_independent() {
        let mut bb = Blackboard::default().with_bool("Target", true);
        assert!(bb.set_string("Target", "player").is_err());
        assert!(bb.has_bool("Target"));
        assert!(!bb.has_string("Target"));
    }

    #[test]
    fn create_overwrites_existing_value() {
        let mut bb = Blackboard::default().with_string("CurrentState", "Idle");
        bb.create_string("CurrentState", "Chasing");
        assert_eq!(bb.string_value("CurrentState"), "Chasing");
        assert!(!bb.is_values_changed());
    }
}
