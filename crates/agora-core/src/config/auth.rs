//! Token signing configuration.

use serde::{Deserialize, Serialize};

/// Bearer token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for token signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token lifetime as a duration string (`"7d"`, `"12h"`, `"30m"`, `"3600"`).
    #[serde(default = "default_token_ttl")]
    pub token_ttl: String,
    /// Remaining lifetime, in seconds, below which a token is due for reissue.
    #[serde(default = "default_refresh_threshold")]
    pub refresh_threshold_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl: default_token_ttl(),
            refresh_threshold_seconds: default_refresh_threshold(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_token_ttl() -> String {
    "7d".to_string()
}

fn default_refresh_threshold() -> i64 {
    300
}
