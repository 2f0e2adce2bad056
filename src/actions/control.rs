//! Branching and flow-control actions

use anyhow::Context as _;
use serde_json::Value;

use crate::engine::branch::BranchArms;
use crate::engine::registry::ActionUnit;
use crate::engine::store::Scope;
use crate::eval::value_text;

/// `check-value`: compare a stored variable against an evaluated value
/// and continue through the matching branch arm
///
/// Parameters: `variable`, `scope` (tag), `comparison` (`exists`,
/// `equals`, `not-equals`, `greater`, `less`, `contains`), `value`, and
/// the `if_true`/`if_false` branch policies. A missing arm stalls the
/// run when the condition lands on it.
pub fn check_value() -> ActionUnit {
    ActionUnit::new("check-value", |seq, cache, record| {
        let name = record
            .str_param("variable")
            .context("check-value requires a 'variable' parameter")?;
        let scope = record.int_param("scope").unwrap_or(1);
        let current = Scope::from_tag(scope).and_then(|scope| seq.vars().get(scope, name, cache));
        let expected = record
            .str_param("value")
            .and_then(|raw| seq.evaluate(raw, cache));
        let comparison = record.str_param("comparison").unwrap_or("exists");

        let result = compare(comparison, current.as_ref(), expected.as_ref());
        let arms = BranchArms::from_record(record);
        seq.jump_to(cache, &arms, result);
        Ok(())
    })
}

/// `stop`: end the run here by never handing control back
///
/// The completion callback does not fire; stopping is a stall on
/// purpose, not a completion.
pub fn stop() -> ActionUnit {
    ActionUnit::new("stop", |_seq, _cache, _record| Ok(()))
}

fn compare(kind: &str, current: Option<&Value>, expected: Option<&Value>) -> bool {
    match kind {
        "exists" => current.is_some_and(|value| !value.is_null()),
        "equals" => matches!((current, expected), (Some(a), Some(b)) if loose_eq(a, b)),
        "not-equals" => !matches!((current, expected), (Some(a), Some(b)) if loose_eq(a, b)),
        "greater" => match (current, expected) {
            (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x > y,
                _ => false,
            },
            _ => false,
        },
        "less" => match (current, expected) {
            (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x < y,
                _ => false,
            },
            _ => false,
        },
        "contains" => match (current, expected) {
            (Some(Value::Array(items)), Some(needle)) => items.contains(needle),
            (Some(haystack), Some(needle)) => {
                value_text(haystack).contains(&value_text(needle))
            }
            _ => false,
        },
        other => {
            tracing::warn!("Unknown comparison '{}'; treating as false", other);
            false
        }
    }
}

/// Equality with numeric awareness: numbers compare as numbers, mixed
/// types compare by rendered text
fn loose_eq(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x == y;
    }
    value_text(a) == value_text(b)
}
