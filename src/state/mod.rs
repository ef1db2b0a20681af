// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Transport-safe snapshots of instance configuration.
//!
//! A [`State`] maps attribute names to plain JSON values. Reference attributes
//! hold instance names, never the referenced instance's own state.

mod marshal;
mod validate;

pub use marshal::{restore, snapshot};
pub use validate::{references_in, references_of, validate_references, validate_required};

use crate::config::consts::REDACTED;
use crate::schema::Attribute;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(pub BTreeMap<String, Value>);

impl State {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy with every non-null sensitive attribute replaced by a marker.
    pub fn redacted(&self, attributes: &[Attribute]) -> State {
        let mut state = self.clone();
        for attribute in attributes.iter().filter(|a| a.sensitive) {
            if let Some(value) = state.0.get_mut(&attribute.name) {
                if !value.is_null() {
                    *value = Value::String(REDACTED.to_string());
                }
            }
        }
        state
    }
}

impl From<BTreeMap<String, Value>> for State {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl From<State> for BTreeMap<String, Value> {
    fn from(state: State) -> Self {
        state.0
    }
}

impl FromIterator<(String, Value)> for State {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
