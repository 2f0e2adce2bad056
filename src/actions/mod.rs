//! Built-in action units
//!
//! A small pack covering the common shapes of action implementations:
//! synchronous continuation (`log-message`, `store-value`,
//! `modify-value`), branching (`check-value`), timer suspension
//! (`wait`), and deliberate stalling (`stop`). Hosts install them with
//! [`Engine::install`](crate::Engine::install) and add their own units
//! alongside.

pub mod control;
pub mod output;
pub mod timing;
pub mod variables;

use crate::engine::registry::ActionUnit;

/// Every built-in unit, ready to install
pub fn units() -> Vec<ActionUnit> {
    vec![
        output::log_message(),
        variables::store_value(),
        variables::modify_value(),
        control::check_value(),
        control::stop(),
        timing::wait(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_installs_under_expected_names() {
        let engine = crate::Engine::new();
        engine.install(units());

        for name in [
            "log-message",
            "store-value",
            "modify-value",
            "check-value",
            "stop",
            "wait",
        ] {
            assert!(engine.registry().has(name), "missing builtin '{name}'");
        }
    }
}
