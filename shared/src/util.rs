/// Current UTC timestamp (Unix milliseconds)
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Minutes to milliseconds
pub const fn minutes_to_millis(minutes: i64) -> i64 {
    minutes * 60 * 1000
}
