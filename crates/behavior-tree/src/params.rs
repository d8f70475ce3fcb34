//! Opaque parameter bags carried by node kinds.
//!
//! A node kind reads what it needs from [`Params`] once, at construction, and
//! hands the same bag back through its `params()` hook so documents can
//! persist it. The scheduler never looks inside.

use std::collections::BTreeMap;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ParamValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    String(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    #[must_use]
    pub fn with_bool(mut self, name: impl Into<String>, value: bool) -> Self {
        self.insert(name, ParamValue::Bool(value));
        self
    }

    #[must_use]
    pub fn with_int(mut self, name: impl Into<String>, value: i32) -> Self {
        self.insert(name, ParamValue::Int(value));
        self
    }

    #[must_use]
    pub fn with_float(mut self, name: impl Into<String>, value: f32) -> Self {
        self.insert(name, ParamValue::Float(value));
        self
    }

    #[must_use]
    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, ParamValue::String(value.into()));
        self
    }

    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => *v,
            _ => default,
        }
    }

    pub fn int_or(&self, name: &str, default: i32) -> i32 {
        match self.get(name) {
            Some(ParamValue::Int(v)) => *v,
            _ => default,
        }
    }

    /// Integers are accepted, since documents may drop the fractional part.
    pub fn float_or(&self, name: &str, default: f32) -> f32 {
        match self.get(name) {
            Some(ParamValue::Float(v)) => *v,
            Some(ParamValue::Int(v)) => *v as f32,
            _ => default,
        }
    }

    pub fn string_or(&self, name: &str, default: &str) -> String {
        match self.get(name) {
            Some(ParamValue::String(v)) => v.clone(),
            _ => default.to_owned(),
        }
    }

    /// Reads a blackboard key name. Missing keys yield an empty string,
    /// which never matches a blackboard entry.
    pub fn blackboard_key(&self, name: &str) -> String {
        self.string_or(name, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_reads_fall_back_on_mismatch() {
        let params = Params::new()
            .with_float("CooldownTime", 2.5)
            .with_int("Ticks", 3)
            .with_string("StaminaKey", "Stamina");

        assert_eq!(params.float_or("CooldownTime", 5.0), 2.5);
        assert_eq!(params.float_or("Ticks", 0.0), 3.0);
        assert_eq!(params.int_or("CooldownTime", 7), 7);
        assert_eq!(params.blackboard_key("StaminaKey"), "Stamina");
        assert_eq!(params.blackboard_key("Missing"), "");
        assert!(params.bool_or("Missing", true));
    }
}
