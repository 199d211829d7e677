use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use crate::utils::errors::WardenError;

///
/// Counts events per key within a fixed window. The login handler refuses
/// requests once the count passes its configured limit.
///
/// Injected behind a trait so deployments can swap in a shared store - the
/// in-memory implementation below is per-process.
///
#[tonic::async_trait]
pub trait RateLimiter: Send + Sync {
    ///
    /// Record an event against the key and return the count seen in the
    /// current window, including this one.
    ///
    async fn increment(&self, key: &str, window_ms: i64, now: DateTime<Utc>)
        -> Result<u32, WardenError>;
}

#[derive(Default)]
pub struct MemoryRateLimiter {
    windows: Mutex<HashMap<String, (DateTime<Utc>, u32)>>,
}

#[tonic::async_trait]
impl RateLimiter for MemoryRateLimiter {
    async fn increment(&self, key: &str, window_ms: i64, now: DateTime<Utc>)
        -> Result<u32, WardenError> {

        let mut windows = self.windows.lock();
        let window = Duration::milliseconds(window_ms);

        let entry = windows.entry(key.to_string()).or_insert((now, 0));
        if now - entry.0 >= window {
            *entry = (now, 0); // The window has rolled over.
        }

        entry.1 += 1;
        Ok(entry.1)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2021-06-01T12:00:00Z".parse().unwrap()
    }

    #[tokio::test]
    async fn should_count_events_within_the_window() {
        let limiter = MemoryRateLimiter::default();
        assert_eq!(limiter.increment("login:ip:1.2.3.4", 60_000, now()).await.unwrap(), 1);
        assert_eq!(limiter.increment("login:ip:1.2.3.4", 60_000, now()).await.unwrap(), 2);
        assert_eq!(limiter.increment("login:ip:5.6.7.8", 60_000, now()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_reset_when_the_window_rolls_over() {
        let limiter = MemoryRateLimiter::default();
        limiter.increment("key", 60_000, now()).await.unwrap();
        limiter.increment("key", 60_000, now()).await.unwrap();

        let later = now() + Duration::seconds(61);
        assert_eq!(limiter.increment("key", 60_000, later).await.unwrap(), 1);
    }
}
