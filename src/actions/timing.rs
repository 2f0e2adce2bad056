//! Timer suspension action

use anyhow::anyhow;
use std::time::Duration;

use crate::engine::registry::ActionUnit;

/// `wait`: suspend the run for `millis` milliseconds, then advance
///
/// The implementation returns immediately after scheduling the timer;
/// the run resumes on the runtime's timer callback with the same cache.
/// A zero or negative duration advances synchronously.
pub fn wait() -> ActionUnit {
    ActionUnit::new("wait", |seq, cache, record| {
        let raw = record.str_param("millis").unwrap_or("0");
        let millis = seq.evaluate_int(raw, cache).max(0) as u64;
        if millis == 0 {
            seq.advance(cache);
            return Ok(());
        }

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| anyhow!("wait requires a tokio runtime"))?;
        let seq = seq.clone();
        let cache = cache.clone();
        handle.spawn(async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            seq.advance(&cache);
        });
        Ok(())
    })
}
