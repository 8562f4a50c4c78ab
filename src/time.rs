//! Time utilities.

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_is_reasonable() {
        let ts = now_timestamp();
        assert!(ts > 1704067200, "timestamp {} is too old", ts);
        assert!(ts < 4102444800, "timestamp {} is too far in future", ts);
    }
}
