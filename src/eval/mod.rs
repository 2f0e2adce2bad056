//! Expression evaluation seam
//!
//! Action parameters are authored as template strings and resolved at
//! execution time through the engine's evaluator. The contract fails
//! closed: whatever goes wrong inside an evaluator, callers get a
//! neutral default (absent value, empty text, zero, false) and the
//! failure is logged, never propagated as a step failure.

pub mod template;

pub use template::TemplateEvaluator;

use serde_json::Value;

use crate::engine::cache::InvocationCache;
use crate::engine::store::VariableStore;

/// Resolves template content against a run's variable scopes
///
/// Implementations must be side-effect free with respect to engine
/// state: actions mutate variables, evaluators only read them.
pub trait Evaluator: Send + Sync {
    /// Evaluate template content to a value
    ///
    /// `None` means the content did not resolve: an unset variable, a
    /// malformed placeholder, or any internal failure.
    fn evaluate(
        &self,
        content: &str,
        vars: &VariableStore,
        cache: &InvocationCache,
    ) -> Option<Value>;

    /// Evaluate to text; unresolved content renders empty
    fn evaluate_text(&self, content: &str, vars: &VariableStore, cache: &InvocationCache) -> String {
        match self.evaluate(content, vars, cache) {
            Some(value) => value_text(&value),
            None => String::new(),
        }
    }

    /// Evaluate to an integer; unresolved or non-numeric content yields 0
    fn evaluate_int(&self, content: &str, vars: &VariableStore, cache: &InvocationCache) -> i64 {
        match self.evaluate(content, vars, cache) {
            Some(Value::Number(num)) => num
                .as_i64()
                .or_else(|| num.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Some(Value::String(text)) => text.trim().parse().unwrap_or(0),
            Some(Value::Bool(b)) => i64::from(b),
            _ => 0,
        }
    }

    /// Evaluate to a boolean; unresolved content is false
    fn evaluate_bool(&self, content: &str, vars: &VariableStore, cache: &InvocationCache) -> bool {
        match self.evaluate(content, vars, cache) {
            Some(value) => value_truthy(&value),
            None => false,
        }
    }
}

/// Render a value the way templates splice it into surrounding text
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Truthiness used when an evaluated value gates a condition
pub fn value_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(num) => num.as_f64().is_some_and(|f| f != 0.0),
        Value::String(text) => !text.is_empty() && text != "false",
        Value::Array(_) | Value::Object(_) => true,
    }
}
