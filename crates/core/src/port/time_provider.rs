// Time Provider Port - wall clock for run durations

/// Clock used to time test runs and subprocesses
pub trait TimeProvider: Send + Sync {
    /// Milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Milliseconds since `start_millis`, never negative
    ///
    /// The wall clock can step backwards (NTP on CI hosts), so a
    /// negative difference is reported as 0.
    fn elapsed_millis(&self, start_millis: i64) -> i64 {
        (self.now_millis() - start_millis).max(0)
    }
}

/// Wall clock backed by chrono
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClock(i64);

    impl TimeProvider for FixedClock {
        fn now_millis(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn test_elapsed_millis() {
        assert_eq!(FixedClock(1_500).elapsed_millis(1_000), 500);
    }

    #[test]
    fn test_clock_step_back_is_zero() {
        assert_eq!(FixedClock(1_000).elapsed_millis(1_500), 0);
    }
}
