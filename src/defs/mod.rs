//! Sequence definitions: the data an automation author produces
//!
//! A definition is a named, ordered list of opaque action records. The
//! engine never interprets record parameters itself; each record is handed
//! whole to the registered action implementation that matches its name.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub mod loader;

/// Kind of surface a sequence definition is attached to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    /// Invoked explicitly by name, typically with caller-supplied context
    #[default]
    Command,
    /// Fired by the host when a matching occurrence happens
    Event,
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceKind::Command => write!(f, "Command"),
            SequenceKind::Event => write!(f, "Event"),
        }
    }
}

/// A single step: an action name plus whatever parameters that action
/// understands, preserved untyped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    /// Name the record is resolved against the action registry with
    pub name: String,

    /// Remaining parameters, kept as raw JSON for the implementation
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ActionRecord {
    /// Create a record with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
        }
    }

    /// Add one parameter, builder style
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Look up a raw parameter value
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Look up a parameter expected to be a string
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Look up a parameter expected to be an integer
    pub fn int_param(&self, key: &str) -> Option<i64> {
        self.params.get(key).and_then(Value::as_i64)
    }

    /// Look up a parameter expected to be a boolean
    pub fn bool_param(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(Value::as_bool)
    }
}

/// A named, ordered action list authored as data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceDef {
    /// Surface this definition is attached to
    #[serde(default)]
    pub kind: SequenceKind,

    /// Name the definition is indexed under
    pub name: String,

    /// Ordered steps; position is meaningful, jump targets refer to it
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

impl SequenceDef {
    /// Create a definition from parts
    pub fn new(kind: SequenceKind, name: impl Into<String>, actions: Vec<ActionRecord>) -> Self {
        Self {
            kind,
            name: name.into(),
            actions,
        }
    }

    /// Number of steps in the list
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the list has no steps
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// The record at a 0-based step index, if in range
    pub fn step(&self, index: usize) -> Option<&ActionRecord> {
        self.actions.get(index)
    }
}

/// Catalog of loaded definitions, indexed by kind and name
#[derive(Debug, Default)]
pub struct DefsIndex {
    commands: HashMap<String, Arc<SequenceDef>>,
    events: HashMap<String, Arc<SequenceDef>>,
}

impl DefsIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition, replacing any previous one with the same kind
    /// and name
    pub fn insert(&mut self, def: SequenceDef) {
        let map = match def.kind {
            SequenceKind::Command => &mut self.commands,
            SequenceKind::Event => &mut self.events,
        };
        if let Some(previous) = map.insert(def.name.clone(), Arc::new(def)) {
            tracing::debug!("Replaced {} definition '{}'", previous.kind, previous.name);
        }
    }

    /// Look up a command definition by name
    pub fn command(&self, name: &str) -> Option<Arc<SequenceDef>> {
        self.commands.get(name).cloned()
    }

    /// Look up an event definition by name
    pub fn event(&self, name: &str) -> Option<Arc<SequenceDef>> {
        self.events.get(name).cloned()
    }

    /// Look up a definition by kind and name
    pub fn get(&self, kind: SequenceKind, name: &str) -> Option<Arc<SequenceDef>> {
        match kind {
            SequenceKind::Command => self.command(name),
            SequenceKind::Event => self.event(name),
        }
    }

    /// List definition names of one kind, unordered
    pub fn names(&self, kind: SequenceKind) -> Vec<String> {
        let map = match kind {
            SequenceKind::Command => &self.commands,
            SequenceKind::Event => &self.events,
        };
        map.keys().cloned().collect()
    }

    /// Total number of definitions across both kinds
    pub fn len(&self) -> usize {
        self.commands.len() + self.events.len()
    }

    /// Whether the index holds no definitions
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.events.is_empty()
    }
}
