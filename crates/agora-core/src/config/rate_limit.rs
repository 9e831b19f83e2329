//! Per-action rate-limit configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// What happens when an action exceeds its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitMode {
    /// Reject with 429 and `Retry-After`.
    Block,
    /// Log the overrun and let the request through.
    Log,
}

impl std::fmt::Display for LimitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitMode::Block => write!(f, "block"),
            LimitMode::Log => write!(f, "log"),
        }
    }
}

/// Budget for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLimitConfig {
    /// Calls allowed per window.
    pub points: u32,
    /// Window length in seconds.
    pub window_seconds: u64,
    /// Enforcement mode.
    pub mode: LimitMode,
}

impl ActionLimitConfig {
    /// Window length in milliseconds.
    pub fn window_ms(&self) -> i64 {
        (self.window_seconds as i64).saturating_mul(1000)
    }
}

/// Rate-limit configuration keyed by action name
/// (`login`, `password_change`, `session_list`, `token_refresh`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Global switch. When off every check succeeds without counting.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-action overrides. Actions missing here use the built-in budget.
    #[serde(default = "default_actions")]
    pub actions: HashMap<String, ActionLimitConfig>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            actions: default_actions(),
        }
    }
}

impl RateLimitConfig {
    /// Resolves the budget for `action`, falling back to the built-in one.
    pub fn action(&self, action: &str) -> ActionLimitConfig {
        self.actions
            .get(action)
            .copied()
            .or_else(|| default_actions().get(action).copied())
            .unwrap_or(ActionLimitConfig {
                points: 60,
                window_seconds: 60,
                mode: LimitMode::Log,
            })
    }
}

fn default_true() -> bool {
    true
}

fn default_actions() -> HashMap<String, ActionLimitConfig> {
    let mut map = HashMap::new();
    map.insert(
        "login".to_string(),
        ActionLimitConfig {
            points: 5,
            window_seconds: 900,
            mode: LimitMode::Block,
        },
    );
    map.insert(
        "password_change".to_string(),
        ActionLimitConfig {
            points: 3,
            window_seconds: 3_600,
            mode: LimitMode::Block,
        },
    );
    map.insert(
        "session_list".to_string(),
        ActionLimitConfig {
            points: 60,
            window_seconds: 60,
            mode: LimitMode::Log,
        },
    );
    map.insert(
        "token_refresh".to_string(),
        ActionLimitConfig {
            points: 30,
            window_seconds: 60,
            mode: LimitMode::Log,
        },
    );
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_action_falls_back_to_builtin() {
        let config = RateLimitConfig {
            enabled: true,
            actions: HashMap::new(),
        };
        let login = config.action("login");
        assert_eq!(login.mode, LimitMode::Block);
        assert_eq!(login.points, 5);
        assert_eq!(config.action("session_list").mode, LimitMode::Log);
    }

    #[test]
    fn test_override_wins() {
        let mut config = RateLimitConfig::default();
        config.actions.insert(
            "login".to_string(),
            ActionLimitConfig {
                points: 3,
                window_seconds: 60,
                mode: LimitMode::Block,
            },
        );
        assert_eq!(config.action("login").points, 3);
        assert_eq!(config.action("login").window_ms(), 60_000);
    }
}
