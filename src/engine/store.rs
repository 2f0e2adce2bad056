//! Tiered variable storage
//!
//! Variables live in one of three scopes: transient (per run), per-entity
//! (shared by every run attached to the same entity), and global (shared
//! process-wide). Reads of unset names yield `None` rather than failing,
//! and writes to a scope the run cannot address are dropped.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

use super::cache::{EntityId, InvocationCache};

/// Variable scope kinds, tagged the way authoring tools emit them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Lives in the invocation cache and dies with the run
    Transient,
    /// Shared by runs attached to the same entity
    Entity,
    /// Shared by every run in the process
    Global,
}

impl Scope {
    /// Decode the integer tag used in action parameters
    pub fn from_tag(tag: i64) -> Option<Scope> {
        match tag {
            1 => Some(Scope::Transient),
            2 => Some(Scope::Entity),
            3 => Some(Scope::Global),
            _ => None,
        }
    }

    /// The integer tag for this scope
    pub fn tag(&self) -> i64 {
        match self {
            Scope::Transient => 1,
            Scope::Entity => 2,
            Scope::Global => 3,
        }
    }
}

/// Engine-wide variable store
///
/// Transient variables are delegated to the invocation cache passed with
/// each call; entity and global tiers live here behind read-write locks.
/// Values are stored by value, so concurrent writers interleave at whole
/// value granularity and the last write wins.
#[derive(Default)]
pub struct VariableStore {
    entity: RwLock<HashMap<EntityId, HashMap<String, Value>>>,
    global: RwLock<HashMap<String, Value>>,
}

impl VariableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a variable from the given scope
    ///
    /// Unset names, entity reads on runs without an entity, and unknown
    /// scope tags all yield `None`.
    pub fn get(&self, scope: Scope, name: &str, cache: &InvocationCache) -> Option<Value> {
        match scope {
            Scope::Transient => cache.temp_get(name),
            Scope::Entity => {
                let id = cache.entity()?;
                self.entity.read().get(id)?.get(name).cloned()
            }
            Scope::Global => self.global.read().get(name).cloned(),
        }
    }

    /// Write a variable into the given scope
    ///
    /// Entity writes on runs without an entity are dropped. The entity
    /// bucket is created lazily on first write.
    pub fn set(&self, value: Value, scope: Scope, name: &str, cache: &InvocationCache) {
        match scope {
            Scope::Transient => cache.temp_set(name, value),
            Scope::Entity => {
                let Some(id) = cache.entity() else {
                    tracing::debug!("Dropping entity-scope write of '{}': run has no entity", name);
                    return;
                };
                self.entity
                    .write()
                    .entry(id.clone())
                    .or_default()
                    .insert(name.to_string(), value);
            }
            Scope::Global => {
                self.global.write().insert(name.to_string(), value);
            }
        }
    }

    /// Read a variable, storing and returning `default` if it is unset
    ///
    /// When the scope cannot be addressed (entity scope without an
    /// entity), the default is returned without being stored.
    pub fn get_or_insert(
        &self,
        scope: Scope,
        name: &str,
        default: Value,
        cache: &InvocationCache,
    ) -> Value {
        match scope {
            Scope::Transient => cache.temp_get_or_insert(name, default),
            Scope::Entity => {
                let Some(id) = cache.entity() else {
                    return default;
                };
                let mut entity = self.entity.write();
                entity
                    .entry(id.clone())
                    .or_default()
                    .entry(name.to_string())
                    .or_insert(default)
                    .clone()
            }
            Scope::Global => self
                .global
                .write()
                .entry(name.to_string())
                .or_insert(default)
                .clone(),
        }
    }

    /// Drop every variable belonging to one entity
    pub fn clear_entity(&self, id: &EntityId) {
        self.entity.write().remove(id);
    }

    /// Drop every global variable
    pub fn clear_global(&self) {
        self.global.write().clear();
    }

    /// Drop every entity and global variable
    ///
    /// Transient variables are untouched; they belong to their caches.
    pub fn clear_all(&self) {
        self.entity.write().clear();
        self.global.write().clear();
    }
}
