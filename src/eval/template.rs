//! Sandboxed `${...}` template evaluation
//!
//! The default evaluator understands a small, closed placeholder grammar:
//!
//! - `${tempVars("name")}`, `${serverVars("name")}`, `${globalVars("name")}`
//!   read one scope explicitly (`serverVars` addresses the per-entity
//!   tier; the name is the one authoring tools emit)
//! - `${"text"}`, `${'text'}`, `${42}`, `${true}` are literals
//! - `${name}` is a bare lookup, tried transient first, then entity,
//!   then global
//!
//! Content without placeholders passes through as a string. A template
//! that is exactly one placeholder resolves to the underlying value with
//! its type intact; mixed content renders each placeholder as text, with
//! unresolved ones rendering empty. No host code ever runs in here, so
//! untrusted definition content cannot reach beyond the variable store.

use serde_json::Value;

use super::Evaluator;
use crate::engine::cache::InvocationCache;
use crate::engine::store::{Scope, VariableStore};

/// The default template evaluator
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateEvaluator;

impl TemplateEvaluator {
    /// Create a template evaluator
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for TemplateEvaluator {
    fn evaluate(
        &self,
        content: &str,
        vars: &VariableStore,
        cache: &InvocationCache,
    ) -> Option<Value> {
        if !content.contains("${") {
            return Some(Value::String(content.to_string()));
        }
        if let Some(expr) = whole_placeholder(content) {
            return resolve_expr(expr, vars, cache);
        }
        substitute(content, vars, cache).map(Value::String)
    }
}

/// The inner expression when `content` is exactly one placeholder
fn whole_placeholder(content: &str) -> Option<&str> {
    let inner = content.strip_prefix("${")?.strip_suffix('}')?;
    if inner.contains("${") || inner.contains('}') {
        return None;
    }
    Some(inner.trim())
}

/// Render mixed content, splicing each placeholder in as text
fn substitute(content: &str, vars: &VariableStore, cache: &InvocationCache) -> Option<String> {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            tracing::warn!("Unterminated placeholder in template: {}", content);
            return None;
        };
        if let Some(value) = resolve_expr(after[..end].trim(), vars, cache) {
            out.push_str(&super::value_text(&value));
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Some(out)
}

fn resolve_expr(expr: &str, vars: &VariableStore, cache: &InvocationCache) -> Option<Value> {
    if expr.is_empty() {
        return None;
    }
    if let Some((scope, name)) = scope_call(expr) {
        return vars.get(scope, name, cache);
    }
    if let Some(text) = quoted(expr) {
        return Some(Value::String(text.to_string()));
    }
    if let Ok(int) = expr.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    match expr {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }
    if is_name(expr) {
        return lookup_tiered(expr, vars, cache);
    }
    tracing::warn!("Unsupported template expression: {}", expr);
    None
}

/// Parse a scope accessor call like `tempVars("name")`
fn scope_call(expr: &str) -> Option<(Scope, &str)> {
    let open = expr.find('(')?;
    let rest = expr.strip_suffix(')')?;
    let scope = match &expr[..open] {
        "tempVars" => Scope::Transient,
        "serverVars" => Scope::Entity,
        "globalVars" => Scope::Global,
        _ => return None,
    };
    let name = quoted(rest[open + 1..].trim())?;
    Some((scope, name))
}

/// Strip a matching pair of single or double quotes
fn quoted(expr: &str) -> Option<&str> {
    let bytes = expr.as_bytes();
    if bytes.len() < 2 {
        return None;
    }
    let quote = bytes[0];
    if (quote != b'"' && quote != b'\'') || bytes[bytes.len() - 1] != quote {
        return None;
    }
    let inner = &expr[1..expr.len() - 1];
    if inner.contains(quote as char) {
        return None;
    }
    Some(inner)
}

fn is_name(expr: &str) -> bool {
    let mut chars = expr.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Bare-name lookup order: transient, then entity, then global
fn lookup_tiered(name: &str, vars: &VariableStore, cache: &InvocationCache) -> Option<Value> {
    vars.get(Scope::Transient, name, cache)
        .or_else(|| vars.get(Scope::Entity, name, cache))
        .or_else(|| vars.get(Scope::Global, name, cache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defs::{SequenceDef, SequenceKind};
    use serde_json::json;
    use std::sync::Arc;

    fn fixture() -> (TemplateEvaluator, VariableStore, InvocationCache) {
        let def = Arc::new(SequenceDef::new(SequenceKind::Command, "tpl", vec![]));
        let cache = InvocationCache::builder(def).entity("guild-1").build();
        (TemplateEvaluator::new(), VariableStore::new(), cache)
    }

    #[test]
    fn plain_text_passes_through() {
        let (eval, vars, cache) = fixture();
        assert_eq!(eval.evaluate("hello", &vars, &cache), Some(json!("hello")));
        assert_eq!(eval.evaluate("", &vars, &cache), Some(json!("")));
    }

    #[test]
    fn whole_placeholder_keeps_value_type() {
        let (eval, vars, cache) = fixture();
        vars.set(json!(7), Scope::Global, "count", &cache);

        assert_eq!(
            eval.evaluate("${globalVars(\"count\")}", &vars, &cache),
            Some(json!(7))
        );
        assert_eq!(eval.evaluate("${42}", &vars, &cache), Some(json!(42)));
        assert_eq!(eval.evaluate("${-3}", &vars, &cache), Some(json!(-3)));
        assert_eq!(eval.evaluate("${true}", &vars, &cache), Some(json!(true)));
        assert_eq!(eval.evaluate("${'hi'}", &vars, &cache), Some(json!("hi")));
    }

    #[test]
    fn scope_accessors_read_their_tier() {
        let (eval, vars, cache) = fixture();
        cache.temp_set("x", json!("temp"));
        vars.set(json!("entity"), Scope::Entity, "x", &cache);
        vars.set(json!("global"), Scope::Global, "x", &cache);

        assert_eq!(
            eval.evaluate("${tempVars(\"x\")}", &vars, &cache),
            Some(json!("temp"))
        );
        assert_eq!(
            eval.evaluate("${serverVars(\"x\")}", &vars, &cache),
            Some(json!("entity"))
        );
        assert_eq!(
            eval.evaluate("${globalVars(\"x\")}", &vars, &cache),
            Some(json!("global"))
        );
    }

    #[test]
    fn bare_names_resolve_transient_first() {
        let (eval, vars, cache) = fixture();
        vars.set(json!("global"), Scope::Global, "x", &cache);
        assert_eq!(eval.evaluate("${x}", &vars, &cache), Some(json!("global")));

        vars.set(json!("entity"), Scope::Entity, "x", &cache);
        assert_eq!(eval.evaluate("${x}", &vars, &cache), Some(json!("entity")));

        cache.temp_set("x", json!("temp"));
        assert_eq!(eval.evaluate("${x}", &vars, &cache), Some(json!("temp")));
    }

    #[test]
    fn mixed_content_renders_as_text() {
        let (eval, vars, cache) = fixture();
        cache.temp_set("who", json!("world"));
        vars.set(json!(2), Scope::Global, "n", &cache);

        assert_eq!(
            eval.evaluate("hello ${who}, take ${n}!", &vars, &cache),
            Some(json!("hello world, take 2!"))
        );
    }

    #[test]
    fn unset_names_render_empty_in_mixed_content() {
        let (eval, vars, cache) = fixture();
        assert_eq!(
            eval.evaluate("<${missing}>", &vars, &cache),
            Some(json!("<>"))
        );
        assert_eq!(eval.evaluate("${missing}", &vars, &cache), None);
    }

    #[test]
    fn malformed_templates_fail_closed() {
        let (eval, vars, cache) = fixture();
        assert_eq!(eval.evaluate("${unterminated", &vars, &cache), None);
        assert_eq!(eval.evaluate("${}", &vars, &cache), None);
        assert_eq!(eval.evaluate("${1 + 2}", &vars, &cache), None);
        assert_eq!(eval.evaluate("${otherVars(\"x\")}", &vars, &cache), None);
        assert_eq!(eval.evaluate_text("${unterminated", &vars, &cache), "");
    }

    #[test]
    fn integer_coercions() {
        let (eval, vars, cache) = fixture();
        vars.set(json!(9), Scope::Global, "n", &cache);
        vars.set(json!("12"), Scope::Global, "text-n", &cache);

        assert_eq!(eval.evaluate_int("3", &vars, &cache), 3);
        assert_eq!(eval.evaluate_int("${globalVars(\"n\")}", &vars, &cache), 9);
        assert_eq!(
            eval.evaluate_int("${globalVars(\"text-n\")}", &vars, &cache),
            12
        );
        assert_eq!(eval.evaluate_int("${missing}", &vars, &cache), 0);
        assert_eq!(eval.evaluate_int("not a number", &vars, &cache), 0);
    }

    #[test]
    fn boolean_coercions() {
        let (eval, vars, cache) = fixture();
        vars.set(json!(true), Scope::Global, "flag", &cache);

        assert!(eval.evaluate_bool("${globalVars(\"flag\")}", &vars, &cache));
        assert!(!eval.evaluate_bool("${missing}", &vars, &cache));
        assert!(!eval.evaluate_bool("", &vars, &cache));
        assert!(eval.evaluate_bool("text", &vars, &cache));
    }
}
