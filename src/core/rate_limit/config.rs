use std::time::Duration;

/// Throughput and retry settings for a [`RateLimitedQueue`](super::RateLimitedQueue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum number of task starts per second
    pub requests_per_second: u32,
    /// Retries allowed after the first rate-limited attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent retry
    pub initial_backoff: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 3,
            max_retries: 3,
            initial_backoff: Duration::from_millis(1000),
        }
    }
}

impl RateLimitConfig {
    /// Minimum spacing between the start of two consecutive tasks.
    ///
    /// A rate of zero is treated as one request per second.
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(1) / self.requests_per_second.max(1)
    }

    /// Backoff before retry number `retry_count` (0-based).
    pub fn backoff_for(&self, retry_count: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_interval() {
        let config = RateLimitConfig {
            requests_per_second: 4,
            ..Default::default()
        };
        assert_eq!(config.min_interval(), Duration::from_millis(250));

        let config = RateLimitConfig {
            requests_per_second: 0,
            ..Default::default()
        };
        assert_eq!(config.min_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_doubles() {
        let config = RateLimitConfig {
            initial_backoff: Duration::from_millis(100),
            ..Default::default()
        };
        assert_eq!(config.backoff_for(0), Duration::from_millis(100));
        assert_eq!(config.backoff_for(1), Duration::from_millis(200));
        assert_eq!(config.backoff_for(2), Duration::from_millis(400));
        assert_eq!(config.backoff_for(5), Duration::from_millis(3200));
    }
}
