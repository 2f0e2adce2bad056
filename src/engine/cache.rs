//! Invocation caches: the per-run unit of execution state
//!
//! One cache is created per fired sequence and lives for the whole run,
//! including across suspensions. It owns the step cursor, the run's
//! transient variables, the optional completion callback, and whatever
//! opaque context the host attached when firing.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::defs::{ActionRecord, SequenceDef};

/// Unique identifier for one run, used for log correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InvocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of the owner of per-entity variables (a guild, tenant,
/// room, or similar)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create an identifier from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// View the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Callback fired exactly once when the cursor runs past the end of the list
pub type CompletionFn = Box<dyn FnOnce() + Send>;

/// Opaque host context threaded through to actions untouched
pub type Context = Arc<dyn Any + Send + Sync>;

struct CacheState {
    /// 0-based index of the step currently (or most recently) executing
    cursor: usize,
    temp: HashMap<String, Value>,
    on_complete: Option<CompletionFn>,
    finished: bool,
}

struct CacheInner {
    id: InvocationId,
    sequence: Arc<SequenceDef>,
    entity: Option<EntityId>,
    context: Option<Context>,
    state: Mutex<CacheState>,
}

/// Shared handle to one run's state
///
/// Clones are cheap and refer to the same run; actions that suspend keep a
/// clone alive and hand it back to the sequencer whenever they resume. A
/// run that stalls simply stops being advanced, and its cache is reclaimed
/// once the last clone drops.
#[derive(Clone)]
pub struct InvocationCache {
    inner: Arc<CacheInner>,
}

impl InvocationCache {
    /// Start building a cache for one run of `sequence`
    pub fn builder(sequence: Arc<SequenceDef>) -> CacheBuilder {
        CacheBuilder {
            sequence,
            entity: None,
            context: None,
            temp: HashMap::new(),
            on_complete: None,
        }
    }

    /// This run's identifier
    pub fn id(&self) -> InvocationId {
        self.inner.id
    }

    /// The definition this run executes
    pub fn sequence(&self) -> &Arc<SequenceDef> {
        &self.inner.sequence
    }

    /// The entity owning this run's per-entity variables, if any
    pub fn entity(&self) -> Option<&EntityId> {
        self.inner.entity.as_ref()
    }

    /// The opaque host context attached at fire time, if any
    pub fn context(&self) -> Option<&Context> {
        self.inner.context.as_ref()
    }

    /// Downcast the host context to a concrete type
    pub fn context_as<T>(&self) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let context = self.inner.context.clone()?;
        context.downcast().ok()
    }

    /// Current cursor position (0-based)
    pub fn cursor(&self) -> usize {
        self.inner.state.lock().cursor
    }

    /// Whether this run has completed (ran past the end of its list)
    ///
    /// A stalled run never becomes finished; it is simply no longer
    /// advanced.
    pub fn is_finished(&self) -> bool {
        self.inner.state.lock().finished
    }

    /// Read one transient variable
    pub fn temp_get(&self, name: &str) -> Option<Value> {
        self.inner.state.lock().temp.get(name).cloned()
    }

    /// Write one transient variable
    pub fn temp_set(&self, name: &str, value: Value) {
        self.inner.state.lock().temp.insert(name.to_string(), value);
    }

    /// Read one transient variable, inserting `default` if unset
    pub fn temp_get_or_insert(&self, name: &str, default: Value) -> Value {
        let mut state = self.inner.state.lock();
        state
            .temp
            .entry(name.to_string())
            .or_insert(default)
            .clone()
    }

    /// The record at the current cursor, if the cursor is in range
    pub(crate) fn current(&self) -> Option<ActionRecord> {
        let state = self.inner.state.lock();
        self.inner.sequence.step(state.cursor).cloned()
    }

    /// Move the cursor one step forward and return the record now under
    /// it, or `None` once the list is exhausted
    pub(crate) fn advance_cursor(&self) -> Option<ActionRecord> {
        let mut state = self.inner.state.lock();
        state.cursor = state.cursor.saturating_add(1);
        self.inner.sequence.step(state.cursor).cloned()
    }

    /// Reposition the cursor at `target` and return the record there, or
    /// `None` (cursor untouched) when `target` is past the end
    pub(crate) fn jump_cursor(&self, target: usize) -> Option<ActionRecord> {
        let mut state = self.inner.state.lock();
        let record = self.inner.sequence.step(target).cloned()?;
        state.cursor = target;
        Some(record)
    }

    /// Mark the run finished and surrender the completion callback
    ///
    /// Only the first call yields the callback; later calls return `None`,
    /// which keeps completion an exactly-once event.
    pub(crate) fn finish(&self) -> Option<CompletionFn> {
        let mut state = self.inner.state.lock();
        state.finished = true;
        state.on_complete.take()
    }
}

impl fmt::Debug for InvocationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("InvocationCache")
            .field("id", &self.inner.id)
            .field("sequence", &self.inner.sequence.name)
            .field("entity", &self.inner.entity)
            .field("cursor", &state.cursor)
            .field("finished", &state.finished)
            .finish()
    }
}

/// Builder for invocation caches
///
/// Command-style entry points usually attach an entity and a context;
/// event-style entry points usually seed transient variables extracted
/// from the triggering occurrence. Both are optional either way.
pub struct CacheBuilder {
    sequence: Arc<SequenceDef>,
    entity: Option<EntityId>,
    context: Option<Context>,
    temp: HashMap<String, Value>,
    on_complete: Option<CompletionFn>,
}

impl CacheBuilder {
    /// Attach the entity owning per-entity variables for this run
    pub fn entity(mut self, id: impl Into<EntityId>) -> Self {
        self.entity = Some(id.into());
        self
    }

    /// Attach an opaque host context actions can downcast
    pub fn context<T>(mut self, context: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.context = Some(Arc::new(context));
        self
    }

    /// Seed one transient variable before the run starts
    pub fn temp(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.temp.insert(name.into(), value.into());
        self
    }

    /// Seed several transient variables before the run starts
    pub fn temps(mut self, vars: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.temp.extend(vars);
        self
    }

    /// Register the callback fired when the run completes
    pub fn on_complete(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Finish building the cache
    pub fn build(self) -> InvocationCache {
        InvocationCache {
            inner: Arc::new(CacheInner {
                id: InvocationId::new(),
                sequence: self.sequence,
                entity: self.entity,
                context: self.context,
                state: Mutex::new(CacheState {
                    cursor: 0,
                    temp: self.temp,
                    on_complete: self.on_complete,
                    finished: false,
                }),
            }),
        }
    }
}
