use chrono::{DateTime, TimeDelta, Utc};
use tokio::time::{Duration, Instant};

/// Access token together with the instant it stops being served.
///
/// `expires_at` is always `set time + safety window`, never the lifetime the
/// OAuth endpoint reports.
#[derive(Debug, Clone)]
pub struct CachedCredential {
    pub value: String,
    pub expires_at: Instant,
    /// wall-clock view of `expires_at`, for logs and metrics only
    pub expires_at_utc: DateTime<Utc>,
}

impl CachedCredential {
    pub fn new(value: String, safety_window: Duration) -> Self {
        let expires_at = Instant::now() + safety_window;
        let expires_at_utc =
            Utc::now() + TimeDelta::from_std(safety_window).unwrap_or_else(|_| TimeDelta::zero());
        Self {
            value,
            expires_at,
            expires_at_utc,
        }
    }

    /// Check if the token may still be handed out
    pub fn is_valid(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn valid_strictly_before_expiry() {
        let window = Duration::from_secs(50 * 60);
        let credential = CachedCredential::new("abc".to_owned(), window);
        assert!(credential.is_valid());

        tokio::time::advance(window - Duration::from_millis(1)).await;
        assert!(credential.is_valid());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!credential.is_valid());
    }

    #[tokio::test(start_paused = true)]
    async fn wall_clock_expiry_follows_window() {
        let before = Utc::now();
        let credential = CachedCredential::new("abc".to_owned(), Duration::from_secs(3000));
        let delta = credential.expires_at_utc - before;
        assert!(delta >= TimeDelta::seconds(3000));
        assert!(delta < TimeDelta::seconds(3005));
    }
}
