//! Wall-clock helpers.

use chrono::Utc;

/// Milliseconds since the UNIX epoch.
pub type Millis = i64;

/// Current wall-clock time in milliseconds since the UNIX epoch.
#[must_use]
pub fn now_millis() -> Millis {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }
}
