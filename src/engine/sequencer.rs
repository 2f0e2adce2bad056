//! The step cursor and continuation protocol
//!
//! A sequencer drives runs one step at a time. Nothing here loops over
//! the action list: after a step executes, the run only moves if that
//! step's implementation hands control back by calling [`Sequencer::advance`]
//! or [`Sequencer::jump_to`]. That call may happen synchronously inside
//! the implementation, or much later from a timer or host callback that
//! captured a clone of the sequencer and the cache. A step that never
//! calls back leaves the run suspended; if nothing holds a resumption
//! handle, the run has stalled and is dropped with its cache.
//!
//! Steps are serialized engine-wide: a reentrant turn lock is held while
//! a step (and any synchronous chain it triggers) executes, so two runs
//! never interleave mid-step even when resumed from different threads.

use serde_json::Value;
use std::sync::Arc;

use super::EngineInner;
use super::branch::{self, BranchArms, JumpTarget};
use super::cache::InvocationCache;
use super::store::VariableStore;
use crate::defs::ActionRecord;

/// Handle that drives execution over invocation caches
///
/// Clones are cheap and share the same engine. Action implementations
/// receive a borrowed sequencer and clone it when they need to resume a
/// run after suspending.
#[derive(Clone)]
pub struct Sequencer {
    pub(crate) engine: Arc<EngineInner>,
}

impl Sequencer {
    /// Begin a run: execute the step under the cursor
    ///
    /// On a fresh cache that is step 0. An empty action list completes
    /// the run immediately, firing its completion callback.
    pub fn start(&self, cache: &InvocationCache) {
        let _turn = self.engine.turn.lock();
        match cache.current() {
            Some(record) => self.run_step(cache, record),
            None => self.complete(cache),
        }
    }

    /// The continuation primitive: move to the next step and execute it
    ///
    /// Completes the run when the cursor moves past the end of the list.
    /// Every action implementation that wants the run to proceed calls
    /// this exactly once, now or later.
    pub fn advance(&self, cache: &InvocationCache) {
        let _turn = self.engine.turn.lock();
        match cache.advance_cursor() {
            Some(record) => self.run_step(cache, record),
            None => self.complete(cache),
        }
    }

    /// Resolve a conditional step's branch and continue accordingly
    ///
    /// Picks the arm for `result`, evaluates its jump amount, and either
    /// falls through, jumps, or stalls. A missing arm stalls the run, as
    /// does a target outside the action list; neither fires the
    /// completion callback.
    pub fn jump_to(&self, cache: &InvocationCache, arms: &BranchArms, result: bool) {
        let _turn = self.engine.turn.lock();
        let Some(policy) = arms.arm(result) else {
            tracing::debug!(
                "Run {} has no branch policy for result {}; stalling",
                cache.id(),
                result
            );
            return;
        };

        let target = branch::resolve(policy, cache.cursor(), |amount| {
            self.evaluate_int(amount, cache)
        });
        match target {
            JumpTarget::Next => self.advance(cache),
            JumpTarget::Step(step) => {
                let record = usize::try_from(step)
                    .ok()
                    .and_then(|index| cache.jump_cursor(index));
                match record {
                    Some(record) => self.run_step(cache, record),
                    None => {
                        tracing::debug!(
                            "Run {} jump target {} is outside '{}' ({} steps); stalling",
                            cache.id(),
                            step,
                            cache.sequence().name,
                            cache.sequence().len()
                        );
                    }
                }
            }
        }
    }

    /// The engine's variable store
    pub fn vars(&self) -> &VariableStore {
        &self.engine.vars
    }

    /// The engine this sequencer belongs to
    pub fn engine(&self) -> super::Engine {
        super::Engine {
            inner: self.engine.clone(),
        }
    }

    /// Evaluate template content against the run's scopes
    pub fn evaluate(&self, content: &str, cache: &InvocationCache) -> Option<Value> {
        self.engine.evaluator.evaluate(content, &self.engine.vars, cache)
    }

    /// Evaluate template content, rendering the result as text
    pub fn evaluate_text(&self, content: &str, cache: &InvocationCache) -> String {
        self.engine
            .evaluator
            .evaluate_text(content, &self.engine.vars, cache)
    }

    /// Evaluate template content, coercing the result to an integer
    pub fn evaluate_int(&self, content: &str, cache: &InvocationCache) -> i64 {
        self.engine
            .evaluator
            .evaluate_int(content, &self.engine.vars, cache)
    }

    /// Evaluate template content, coercing the result to a boolean
    pub fn evaluate_bool(&self, content: &str, cache: &InvocationCache) -> bool {
        self.engine
            .evaluator
            .evaluate_bool(content, &self.engine.vars, cache)
    }

    /// Execute one step inside the failure boundary
    ///
    /// An `Err` from the implementation is reported here and goes no
    /// further: the cursor stays on the failing step and the run stalls.
    fn run_step(&self, cache: &InvocationCache, record: ActionRecord) {
        if self.engine.config.debug {
            tracing::debug!(
                "Run {} of '{}' at step {}: '{}'",
                cache.id(),
                cache.sequence().name,
                cache.cursor() + 1,
                record.name
            );
        }
        if let Err(err) = self.engine.registry.invoke(self, cache, &record) {
            self.engine.reporter.failing_step(cache, &err);
        }
    }

    fn complete(&self, cache: &InvocationCache) {
        if let Some(callback) = cache.finish() {
            tracing::trace!("Run {} of '{}' completed", cache.id(), cache.sequence().name);
            callback();
        }
    }
}
