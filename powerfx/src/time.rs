//! Utilities for tracking time.

use std::time::Duration;

/// Returns how many milliseconds passed since `1970-01-01 00:00:00`.
pub fn timestamp_ms() -> i64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(x) => x.as_millis() as _,
        Err(err) => -(err.duration().as_millis() as i64),
    }
}

/// Returns how long the system has been up.
pub fn uptime() -> Duration {
    Duration::from_secs(sysinfo::System::uptime())
}

#[cfg(test)]
mod tests {
    #[test]
    fn timestamp() {
        assert!(super::timestamp_ms() > 0);
    }
}
