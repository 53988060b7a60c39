//! Animation-parameter sink
//!
//! The animator-sync pass writes booleans and floats here every tick.
//! Writes are fire-and-forget. With sanity checks enabled, writes to
//! parameters the sink does not declare are skipped and reported once.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatorValue {
    Bool(bool),
    Float(f32),
}

pub trait AnimatorSink: Send + Sync {
    fn has_parameter(&self, name: &str) -> bool;
    fn set_bool(&mut self, name: &str, value: bool);
    fn set_float(&mut self, name: &str, value: f32);
}

/// Accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnimator;

impl AnimatorSink for NullAnimator {
    fn has_parameter(&self, _name: &str) -> bool {
        true
    }

    fn set_bool(&mut self, _name: &str, _value: bool) {}

    fn set_float(&mut self, _name: &str, _value: f32) {}
}

/// Stores the last value written to each parameter in a shared map.
///
/// When built with `with_parameters`, only those names count as declared.
#[derive(Debug, Default, Clone)]
pub struct AnimatorRecorder {
    values: Arc<Mutex<HashMap<String, AnimatorValue>>>,
    declared: Option<HashSet<String>>,
}

impl AnimatorRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameters<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            values: Arc::default(),
            declared: Some(names.into_iter().map(String::from).collect()),
        }
    }

    pub fn get(&self, name: &str) -> Option<AnimatorValue> {
        self.values.lock().ok().and_then(|v| v.get(name).copied())
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            AnimatorValue::Bool(value) => Some(value),
            AnimatorValue::Float(_) => None,
        }
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            AnimatorValue::Float(value) => Some(value),
            AnimatorValue::Bool(_) => None,
        }
    }

    fn write(&mut self, name: &str, value: AnimatorValue) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(name.to_string(), value);
        }
    }
}

impl AnimatorSink for AnimatorRecorder {
    fn has_parameter(&self, name: &str) -> bool {
        self.declared.as_ref().map_or(true, |d| d.contains(name))
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        self.write(name, AnimatorValue::Bool(value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.write(name, AnimatorValue::Float(value));
    }
}

/// The per-actor view of an animator sink handed to the animator-sync pass.
pub struct AnimatorParameters {
    sink: Box<dyn AnimatorSink>,
    sanity_checks: bool,
    reported_missing: HashSet<String>,
}

impl AnimatorParameters {
    pub fn new(sink: Box<dyn AnimatorSink>, sanity_checks: bool) -> Self {
        Self {
            sink,
            sanity_checks,
            reported_missing: HashSet::new(),
        }
    }

    fn declared(&mut self, name: &str) -> bool {
        if !self.sanity_checks || self.sink.has_parameter(name) {
            return true;
        }
        if self.reported_missing.insert(name.to_string()) {
            warn!("Animator parameter '{}' does not exist, skipping writes", name);
        }
        false
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        if self.declared(name) {
            self.sink.set_bool(name, value);
        }
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        if self.declared(name) {
            self.sink.set_float(name, value);
        }
    }

    /// Parameters skipped by the sanity check so far.
    pub fn missing_parameters(&self) -> impl Iterator<Item = &str> {
        self.reported_missing.iter().map(String::as_str)
    }
}

impl Default for AnimatorParameters {
    fn default() -> Self {
        Self::new(Box::new(NullAnimator), false)
    }
}
