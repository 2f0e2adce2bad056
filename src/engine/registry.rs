//! Action registry and loadable action units
//!
//! The registry maps action names to implementations. Sequence records
//! are resolved against it at invocation time, so installing a unit with
//! an already-used name transparently reroutes every definition that
//! references that name.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::Engine;
use super::cache::InvocationCache;
use super::error::ActionResult;
use super::sequencer::Sequencer;
use crate::defs::ActionRecord;

/// An action implementation
///
/// Receives the sequencer handle, the run's cache, and the raw record for
/// this step. Continuing the run is the implementation's job: it calls
/// `advance` (or `jump_to`) either before returning or later from a
/// callback it scheduled. Returning without doing either suspends or
/// stalls the run. Failures are returned as `Err`, never panicked.
pub type ActionFn =
    Arc<dyn Fn(&Sequencer, &InvocationCache, &ActionRecord) -> ActionResult + Send + Sync>;

/// One-time hook run when a unit is installed into an engine
pub type InitFn = Arc<dyn Fn(&Engine) -> ActionResult + Send + Sync>;

/// A loadable action definition
///
/// Units are the packaging format for actions: a registry name, the
/// implementation, and an optional initialization hook that can register
/// listeners or seed engine state when the unit is installed.
pub struct ActionUnit {
    /// Registry name the implementation answers to
    pub name: String,

    /// The implementation invoked for matching records
    pub action: ActionFn,

    /// Optional hook run once at installation
    pub initialize: Option<InitFn>,
}

impl ActionUnit {
    /// Create a unit from a name and an implementation
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Sequencer, &InvocationCache, &ActionRecord) -> ActionResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            action: Arc::new(action),
            initialize: None,
        }
    }

    /// Attach an initialization hook, builder style
    pub fn with_initialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Engine) -> ActionResult + Send + Sync + 'static,
    {
        self.initialize = Some(Arc::new(hook));
        self
    }
}

/// Name to implementation mapping for action records
#[derive(Default)]
pub struct ActionRegistry {
    actions: RwLock<HashMap<String, ActionFn>>,
}

impl ActionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation under a name, replacing any previous one
    pub fn register(&self, name: impl Into<String>, action: ActionFn) {
        let name = name.into();
        let mut actions = self.actions.write();
        if actions.insert(name.clone(), action).is_some() {
            tracing::debug!("Replaced action implementation '{}'", name);
        }
    }

    /// Whether an implementation is registered under `name`
    pub fn has(&self, name: &str) -> bool {
        self.actions.read().contains_key(name)
    }

    /// Fetch the implementation registered under `name`
    pub fn get(&self, name: &str) -> Option<ActionFn> {
        self.actions.read().get(name).cloned()
    }

    /// List registered action names, unordered
    pub fn names(&self) -> Vec<String> {
        self.actions.read().keys().cloned().collect()
    }

    /// Resolve and invoke the implementation for one record
    ///
    /// An unregistered name is not a failure: it is logged and the run
    /// stalls at this step, since nothing will ever advance it.
    pub fn invoke(
        &self,
        sequencer: &Sequencer,
        cache: &InvocationCache,
        record: &ActionRecord,
    ) -> ActionResult {
        match self.get(&record.name) {
            Some(action) => action(sequencer, cache, record),
            None => {
                tracing::error!(
                    "Action '{}' does not exist; run {} of '{}' stalls",
                    record.name,
                    cache.id(),
                    cache.sequence().name
                );
                Ok(())
            }
        }
    }
}
