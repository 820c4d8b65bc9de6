//! Clock helpers for TTL bookkeeping
//!
//! Expiry horizons are absolute epoch milliseconds. Millisecond resolution
//! is enough for session/cache lifetimes measured in minutes.

use chrono::Utc;

/// Current time as epoch milliseconds
pub fn now_millis() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Expiry horizon `ttl` from now
pub fn expiry_from_now(ttl: std::time::Duration) -> u64 {
    now_millis().saturating_add(ttl.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01 in epoch millis; a sane lower bound for "now"
        assert!(now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_expiry_from_now_is_in_the_future() {
        let now = now_millis();
        let expiry = expiry_from_now(Duration::from_secs(600));
        assert!(expiry >= now + 599_000);
    }
}
