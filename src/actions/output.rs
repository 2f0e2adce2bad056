//! Logging action

use crate::engine::registry::ActionUnit;

/// `log-message`: render the `message` template and log it, then continue
pub fn log_message() -> ActionUnit {
    ActionUnit::new("log-message", |seq, cache, record| {
        let template = record.str_param("message").unwrap_or_default();
        let text = seq.evaluate_text(template, cache);
        tracing::info!("[{}] {}", cache.sequence().name, text);
        seq.advance(cache);
        Ok(())
    })
}
