//! Branch policies and jump-target arithmetic
//!
//! Conditional steps carry two independent policies, one per side of the
//! condition result. Resolution is pure arithmetic over the current
//! cursor; bounds checking and the stall-on-out-of-range rule belong to
//! the sequencer.

use serde::{Deserialize, Serialize};

use crate::defs::ActionRecord;

/// What a conditional step does on one side of its condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BranchPolicy {
    /// Fall through to the next step
    Continue,

    /// Jump to a 1-based step number evaluated from `amount`
    Absolute {
        /// Expression evaluated to the target step number
        amount: String,
    },

    /// Skip `amount` steps relative to the current one
    Relative {
        /// Expression evaluated to the skip count; negative skips backwards
        amount: String,
    },
}

/// The two policies of a conditional step
///
/// A missing side means the run stalls when the condition lands there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchArms {
    /// Policy applied when the condition holds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_true: Option<BranchPolicy>,

    /// Policy applied when the condition does not hold
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_false: Option<BranchPolicy>,
}

impl BranchArms {
    /// Read the `if_true`/`if_false` parameters of an action record
    ///
    /// The two arms parse independently; a malformed policy falls back
    /// to an absent arm, so a misauthored side stalls instead of jumping
    /// somewhere surprising while the intact side keeps branching.
    pub fn from_record(record: &ActionRecord) -> Self {
        Self {
            if_true: Self::arm_from(record, "if_true"),
            if_false: Self::arm_from(record, "if_false"),
        }
    }

    fn arm_from(record: &ActionRecord, key: &str) -> Option<BranchPolicy> {
        let raw = record.param(key)?;
        match serde_json::from_value(raw.clone()) {
            Ok(policy) => Some(policy),
            Err(err) => {
                tracing::warn!("Malformed '{}' policy on '{}': {}", key, record.name, err);
                None
            }
        }
    }

    /// The policy for one condition result, if present
    pub fn arm(&self, result: bool) -> Option<&BranchPolicy> {
        if result {
            self.if_true.as_ref()
        } else {
            self.if_false.as_ref()
        }
    }
}

/// Where a resolved branch lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTarget {
    /// Ordinary fall-through to the continuation
    Next,
    /// A computed 0-based step index, not yet bounds-checked
    Step(i64),
}

/// Resolve a policy into a jump target
///
/// `amount_of` evaluates the policy's expression; it is only called for
/// policies that carry one.
pub fn resolve(
    policy: &BranchPolicy,
    cursor: usize,
    amount_of: impl FnOnce(&str) -> i64,
) -> JumpTarget {
    match policy {
        BranchPolicy::Continue => JumpTarget::Next,
        BranchPolicy::Absolute { amount } => JumpTarget::Step(absolute_target(amount_of(amount))),
        BranchPolicy::Relative { amount } => {
            JumpTarget::Step(relative_target(cursor, amount_of(amount)))
        }
    }
}

/// Convert a 1-based step number into a 0-based index, clamped at 0
pub fn absolute_target(step: i64) -> i64 {
    step.saturating_sub(1).max(0)
}

/// Index of the step after skipping `offset` steps from `cursor`
///
/// An offset of 0 lands on the immediate next step; negative offsets
/// move backwards and may land before the current step.
pub fn relative_target(cursor: usize, offset: i64) -> i64 {
    (cursor as i64).saturating_add(offset).saturating_add(1)
}
