//! Counter key builders.
//!
//! Backends add their own namespace (the Redis client applies the
//! configured `key_prefix`), so keys here are unprefixed.

/// Key for the fixed window of `action` scoped to `scope` (an IP or user ID).
pub fn rate_limit(action: &str, scope: &str) -> String {
    format!("rate:{action}:{scope}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(rate_limit("login", "10.0.0.1"), "rate:login:10.0.0.1");
    }
}
