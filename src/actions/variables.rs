//! Variable manipulation actions

use anyhow::{Context as _, bail};
use serde_json::Value;

use crate::engine::registry::ActionUnit;
use crate::engine::store::Scope;

/// `store-value`: evaluate the `value` template and write it to the
/// variable named by `variable` in the scope tagged by `scope`
///
/// A missing tag defaults to the transient tier; an unknown tag drops
/// the write and the run continues.
pub fn store_value() -> ActionUnit {
    ActionUnit::new("store-value", |seq, cache, record| {
        let name = record
            .str_param("variable")
            .context("store-value requires a 'variable' parameter")?;
        let tag = record.int_param("scope").unwrap_or(1);
        let Some(scope) = Scope::from_tag(tag) else {
            tracing::warn!("store-value: unknown scope tag {}; dropping write of '{}'", tag, name);
            seq.advance(cache);
            return Ok(());
        };
        let raw = record.str_param("value").unwrap_or_default();
        let value = seq.evaluate(raw, cache).unwrap_or(Value::Null);

        seq.vars().set(value, scope, name, cache);
        seq.advance(cache);
        Ok(())
    })
}

/// `modify-value`: apply `op` (`set`, `add`, `subtract`) with the
/// evaluated `amount` to an existing variable, then continue
///
/// Arithmetic treats an unset variable as 0.
pub fn modify_value() -> ActionUnit {
    ActionUnit::new("modify-value", |seq, cache, record| {
        let name = record
            .str_param("variable")
            .context("modify-value requires a 'variable' parameter")?;
        let tag = record.int_param("scope").unwrap_or(1);
        let Some(scope) = Scope::from_tag(tag) else {
            tracing::warn!("modify-value: unknown scope tag {}; leaving '{}' untouched", tag, name);
            seq.advance(cache);
            return Ok(());
        };
        let op = record.str_param("op").unwrap_or("set");
        let raw = record.str_param("amount").unwrap_or_default();
        let amount = seq.evaluate(raw, cache).unwrap_or(Value::Null);

        let next = match op {
            "set" => amount,
            "add" | "subtract" => {
                let current = seq
                    .vars()
                    .get(scope, name, cache)
                    .map(|value| value_num(&value))
                    .unwrap_or(0.0);
                let delta = value_num(&amount);
                let result = if op == "add" {
                    current + delta
                } else {
                    current - delta
                };
                number_value(result)
                    .with_context(|| format!("modify-value produced a non-finite result for '{name}'"))?
            }
            other => bail!("modify-value does not understand op '{other}'"),
        };

        seq.vars().set(next, scope, name, cache);
        seq.advance(cache);
        Ok(())
    })
}

/// Numeric coercion for arithmetic amounts
fn value_num(value: &Value) -> f64 {
    match value {
        Value::Number(num) => num.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Store whole results as integers, everything else as floats
fn number_value(x: f64) -> Option<Value> {
    if x.fract() == 0.0 && x >= i64::MIN as f64 && x <= i64::MAX as f64 {
        return Some(Value::Number((x as i64).into()));
    }
    serde_json::Number::from_f64(x).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{ActionRecord, SequenceDef, SequenceKind};
    use crate::engine::Engine;
    use crate::engine::cache::InvocationCache;
    use serde_json::json;
    use std::sync::Arc;

    fn run(engine: &Engine, actions: Vec<ActionRecord>) -> InvocationCache {
        let def = Arc::new(SequenceDef::new(SequenceKind::Command, "vars", actions));
        let cache = InvocationCache::builder(def).entity("guild-1").build();
        engine.sequencer().start(&cache);
        cache
    }

    #[test]
    fn store_then_read_back_across_scopes() {
        let engine = Engine::new();
        engine.install(super::super::units());

        let cache = run(
            &engine,
            vec![
                ActionRecord::new("store-value")
                    .with_param("variable", "t")
                    .with_param("scope", 1)
                    .with_param("value", "${7}"),
                ActionRecord::new("store-value")
                    .with_param("variable", "e")
                    .with_param("scope", 2)
                    .with_param("value", "entity-side"),
                ActionRecord::new("store-value")
                    .with_param("variable", "g")
                    .with_param("scope", 3)
                    .with_param("value", "${tempVars(\"t\")}"),
            ],
        );

        assert!(cache.is_finished());
        assert_eq!(engine.vars().get(Scope::Transient, "t", &cache), Some(json!(7)));
        assert_eq!(
            engine.vars().get(Scope::Entity, "e", &cache),
            Some(json!("entity-side"))
        );
        assert_eq!(engine.vars().get(Scope::Global, "g", &cache), Some(json!(7)));
    }

    #[test]
    fn modify_adds_and_subtracts() {
        let engine = Engine::new();
        engine.install(super::super::units());

        let cache = run(
            &engine,
            vec![
                ActionRecord::new("modify-value")
                    .with_param("variable", "count")
                    .with_param("scope", 3)
                    .with_param("op", "add")
                    .with_param("amount", "5"),
                ActionRecord::new("modify-value")
                    .with_param("variable", "count")
                    .with_param("scope", 3)
                    .with_param("op", "subtract")
                    .with_param("amount", "${2}"),
            ],
        );

        assert!(cache.is_finished());
        assert_eq!(engine.vars().get(Scope::Global, "count", &cache), Some(json!(3)));
    }

    #[test]
    fn unknown_op_stalls_with_report() {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let engine = Engine::builder()
            .error_sink(
                move |diagnostic: &str, _detail: &str, _cache: &InvocationCache| {
                    sink.lock().push(diagnostic.to_string());
                },
            )
            .build();
        engine.install(super::super::units());

        let cache = run(
            &engine,
            vec![
                ActionRecord::new("modify-value")
                    .with_param("variable", "x")
                    .with_param("op", "divide")
                    .with_param("amount", "2"),
            ],
        );

        assert!(!cache.is_finished());
        let reports = seen.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0], "Error with Command \"vars\", Action #1");
    }

    #[test]
    fn unknown_scope_tag_drops_write_and_continues() {
        let engine = Engine::new();
        engine.install(super::super::units());

        let cache = run(
            &engine,
            vec![
                ActionRecord::new("store-value")
                    .with_param("variable", "x")
                    .with_param("scope", 9)
                    .with_param("value", "lost"),
            ],
        );

        assert!(cache.is_finished());
        for scope in [Scope::Transient, Scope::Entity, Scope::Global] {
            assert_eq!(engine.vars().get(scope, "x", &cache), None);
        }
    }

    #[test]
    fn numeric_coercions() {
        assert_eq!(value_num(&json!(2.5)), 2.5);
        assert_eq!(value_num(&json!("4")), 4.0);
        assert_eq!(value_num(&json!(true)), 1.0);
        assert_eq!(value_num(&json!(null)), 0.0);

        assert_eq!(number_value(2.0), Some(json!(2)));
        assert_eq!(number_value(2.5), Some(json!(2.5)));
        assert_eq!(number_value(f64::NAN), None);
    }
}
