//! Engine core: wiring for the cursor protocol and its collaborators
//!
//! An [`Engine`] owns the action registry, the variable store, the
//! expression evaluator, and the failure reporter. It is cheap to clone
//! and safe to share; runs are driven through the [`Sequencer`] handle it
//! hands out.

// Submodules
pub mod branch;
pub mod cache;
pub mod error;
pub mod registry;
pub mod report;
pub mod sequencer;
pub mod store;

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::defs::DefsIndex;
use crate::defs::loader;
use crate::eval::{Evaluator, TemplateEvaluator};
use error::DefsResult;
use registry::{ActionRegistry, ActionUnit};
use report::{ErrorReporter, ErrorSink, NullSink};
use sequencer::Sequencer;
use store::VariableStore;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory sequence definitions are loaded from
    pub defs_dir: PathBuf,

    /// Log every executed step at debug level
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            defs_dir: PathBuf::from("defs"),
            debug: false,
        }
    }
}

pub(crate) struct EngineInner {
    pub(crate) config: EngineConfig,
    pub(crate) registry: ActionRegistry,
    pub(crate) vars: VariableStore,
    pub(crate) evaluator: Box<dyn Evaluator>,
    pub(crate) reporter: ErrorReporter,
    /// Serializes step execution engine-wide; reentrant so synchronous
    /// action chains can nest without deadlocking
    pub(crate) turn: ReentrantMutex<()>,
}

/// The composition root hosts embed
///
/// Clones share the same state. Install action units, load definitions,
/// then fire runs through [`Engine::sequencer`].
#[derive(Clone)]
pub struct Engine {
    pub(crate) inner: Arc<EngineInner>,
}

impl Engine {
    /// Create an engine with default configuration and collaborators
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building an engine with custom collaborators
    pub fn builder() -> EngineBuilder {
        EngineBuilder {
            config: EngineConfig::default(),
            evaluator: None,
            sink: None,
        }
    }

    /// This engine's configuration
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// The action registry
    pub fn registry(&self) -> &ActionRegistry {
        &self.inner.registry
    }

    /// The variable store
    pub fn vars(&self) -> &VariableStore {
        &self.inner.vars
    }

    /// A sequencer handle for driving runs
    pub fn sequencer(&self) -> Sequencer {
        Sequencer {
            engine: self.inner.clone(),
        }
    }

    /// Install action units into the registry
    ///
    /// Each unit's implementation is registered first, then its
    /// initialization hook runs. A failing hook is logged and does not
    /// unregister the action or block the remaining units.
    pub fn install(&self, units: impl IntoIterator<Item = ActionUnit>) {
        for unit in units {
            let name = unit.name;
            self.inner.registry.register(name.clone(), unit.action);
            tracing::debug!("Installed action unit '{}'", name);
            if let Some(hook) = unit.initialize {
                if let Err(err) = hook(self) {
                    tracing::error!("Initialization of action unit '{}' failed: {:#}", name, err);
                }
            }
        }
    }

    /// Load sequence definitions from the configured directory
    pub fn load_defs(&self) -> DefsResult<DefsIndex> {
        loader::load_dir(&self.inner.config.defs_dir)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for engines with custom collaborators
pub struct EngineBuilder {
    config: EngineConfig,
    evaluator: Option<Box<dyn Evaluator>>,
    sink: Option<Box<dyn ErrorSink>>,
}

impl EngineBuilder {
    /// Use the given configuration
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom expression evaluator
    pub fn evaluator(mut self, evaluator: impl Evaluator + 'static) -> Self {
        self.evaluator = Some(Box::new(evaluator));
        self
    }

    /// Forward failing-step reports to a custom sink
    pub fn error_sink(mut self, sink: impl ErrorSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Finish building the engine
    pub fn build(self) -> Engine {
        let evaluator = self
            .evaluator
            .unwrap_or_else(|| Box::new(TemplateEvaluator::new()));
        let sink = self.sink.unwrap_or_else(|| Box::new(NullSink));
        Engine {
            inner: Arc::new(EngineInner {
                config: self.config,
                registry: ActionRegistry::new(),
                vars: VariableStore::new(),
                evaluator,
                reporter: ErrorReporter::new(sink),
                turn: ReentrantMutex::new(()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn default_config_points_at_defs() {
        let config = EngineConfig::default();
        assert_eq!(config.defs_dir, PathBuf::from("defs"));
        assert!(!config.debug);
    }

    #[test]
    fn install_runs_hooks_after_registration() {
        let engine = Engine::new();
        let hooks = Arc::new(AtomicUsize::new(0));

        let counted = hooks.clone();
        engine.install([
            ActionUnit::new("first", |_seq, _cache, _record| Ok(())).with_initialize(
                move |engine| {
                    // registration happens before the hook runs
                    assert!(engine.registry().has("first"));
                    counted.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            ),
        ]);

        assert_eq!(hooks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_hook_isolates_and_keeps_action() {
        let engine = Engine::new();
        engine.install([
            ActionUnit::new("breaks", |_seq, _cache, _record| Ok(()))
                .with_initialize(|_engine| Err(anyhow!("init failed"))),
            ActionUnit::new("after", |_seq, _cache, _record| Ok(())),
        ]);

        assert!(engine.registry().has("breaks"));
        assert!(engine.registry().has("after"));
    }

    #[test]
    fn clones_share_state() {
        let engine = Engine::new();
        let other = engine.clone();
        engine.install([ActionUnit::new("shared", |_seq, _cache, _record| Ok(()))]);
        assert!(other.registry().has("shared"));
    }
}
