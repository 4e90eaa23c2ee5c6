use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, RwLock};
use tokio::time::Duration;
use tracing::{debug, error, info};

use crate::cache::token::CachedCredential;
use crate::error::AuthError;
use crate::observability::metrics::{
    get_metrics, OUTCOME_FAILURE, OUTCOME_SHARED_FAILURE, OUTCOME_SUCCESS,
};
use crate::sources::fetch::FetchToken;
use crate::sources::oauth2::OAuth2Source;

/// Single-credential token cache with coalesced refresh.
///
/// Reads take the `credential` read lock only. A refresh runs while holding
/// the `refresh` mutex, so at most one exchange is in flight; callers queued
/// behind it re-check the credential and, if that refresh failed, receive its
/// error instead of starting another exchange.
pub struct TokenCache<S = OAuth2Source> {
    source: S,
    safety_window: Duration,
    credential: RwLock<Option<CachedCredential>>,
    refresh: Mutex<RefreshState>,
    /// number of finished refreshes, readable without the mutex
    generation: AtomicU64,
}

#[derive(Default)]
struct RefreshState {
    last_error: Option<AuthError>,
}

impl<S: FetchToken + Send + Sync> TokenCache<S> {
    pub fn new(source: S, safety_window: Duration) -> Self {
        Self {
            source,
            safety_window,
            credential: RwLock::new(None),
            refresh: Mutex::new(RefreshState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Return a valid token, refreshing it if absent or expired.
    pub async fn get_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached().await {
            get_metrics().await.token_cache_hits.inc();
            debug!("serving cached token");
            return Ok(token);
        }

        let seen = self.generation.load(Ordering::Acquire);
        let mut state = self.refresh.lock().await;

        // refreshed while we were queued
        if let Some(token) = self.cached().await {
            get_metrics().await.token_cache_hits.inc();
            return Ok(token);
        }
        if self.generation.load(Ordering::Acquire) != seen {
            if let Some(err) = &state.last_error {
                get_metrics()
                    .await
                    .token_refreshes
                    .with_label_values(&[OUTCOME_SHARED_FAILURE])
                    .inc();
                return Err(err.clone());
            }
        }

        let outcome = self.refresh_credential().await;
        state.last_error = outcome.as_ref().err().cloned();
        self.generation.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn cached(&self) -> Option<String> {
        self.credential
            .read()
            .await
            .as_ref()
            .filter(|credential| credential.is_valid())
            .map(|credential| credential.value.clone())
    }

    /// Caller must hold the `refresh` mutex.
    async fn refresh_credential(&self) -> Result<String, AuthError> {
        let metrics = get_metrics().await;
        match self.source.fetch_token().await {
            Ok(value) => {
                let credential = CachedCredential::new(value.clone(), self.safety_window);
                info!(
                    "access token refreshed, valid until {}",
                    credential.expires_at_utc.to_rfc3339()
                );
                metrics.token_expiry_unix.set(credential.expires_at_utc.timestamp());
                metrics
                    .token_refreshes
                    .with_label_values(&[OUTCOME_SUCCESS])
                    .inc();
                *self.credential.write().await = Some(credential);
                Ok(value)
            }
            Err(e) => {
                error!("token refresh failed: {}", e);
                metrics
                    .token_refreshes
                    .with_label_values(&[OUTCOME_FAILURE])
                    .inc();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(50 * 60);

    #[derive(Clone, Default)]
    struct ScriptedSource {
        calls: Arc<AtomicUsize>,
        fail: Arc<std::sync::atomic::AtomicBool>,
        latency: Duration,
    }

    impl ScriptedSource {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl FetchToken for ScriptedSource {
        async fn fetch_token(&self) -> Result<String, AuthError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(self.latency).await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(AuthError::Rejected {
                    status: 401,
                    body: format!("attempt {n} rejected"),
                });
            }
            Ok(format!("token-{n}"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_call_fetches_then_serves_from_cache() {
        let source = ScriptedSource::default();
        let cache = TokenCache::new(source.clone(), WINDOW);

        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        tokio::time::advance(WINDOW - Duration::from_secs(1)).await;
        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_token_triggers_exactly_one_refresh() {
        let source = ScriptedSource::default();
        let cache = TokenCache::new(source.clone(), WINDOW);

        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        tokio::time::advance(WINDOW).await;

        assert_eq!(cache.get_token().await.unwrap(), "token-2");
        assert_eq!(cache.get_token().await.unwrap(), "token-2");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_refresh() {
        let source = ScriptedSource {
            latency: Duration::from_millis(500),
            ..Default::default()
        };
        let cache = Arc::new(TokenCache::new(source.clone(), WINDOW));

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_refresh_after_expiry() {
        let source = ScriptedSource {
            latency: Duration::from_millis(500),
            ..Default::default()
        };
        let cache = Arc::new(TokenCache::new(source.clone(), WINDOW));

        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        tokio::time::advance(WINDOW).await;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "token-2");
        }
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn waiters_share_the_failure_of_the_refresh_they_waited_on() {
        let source = ScriptedSource {
            latency: Duration::from_millis(500),
            ..Default::default()
        };
        source.set_failing(true);
        let cache = Arc::new(TokenCache::new(source.clone(), WINDOW));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_token().await })
            })
            .collect();

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(err.to_string().contains("attempt 1 rejected"));
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_leaves_state_untouched_and_next_call_retries() {
        let source = ScriptedSource::default();
        let cache = TokenCache::new(source.clone(), WINDOW);

        source.set_failing(true);
        assert!(cache.get_token().await.is_err());
        assert!(cache.get_token().await.is_err());
        assert_eq!(source.calls(), 2);

        source.set_failing(false);
        assert_eq!(cache.get_token().await.unwrap(), "token-3");
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_does_not_extend_expired_token() {
        let source = ScriptedSource::default();
        let cache = TokenCache::new(source.clone(), WINDOW);

        assert_eq!(cache.get_token().await.unwrap(), "token-1");
        tokio::time::advance(WINDOW).await;

        source.set_failing(true);
        assert!(cache.get_token().await.is_err());
        // the expired token is never handed out as a fallback
        assert!(cache.get_token().await.is_err());
        assert_eq!(source.calls(), 3);
    }
}
