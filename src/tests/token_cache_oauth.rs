// Token cache against a mocked OAuth endpoint, on the multi-threaded runtime.

use std::sync::Arc;
use std::time::Duration;

use httpmock::Method::POST;
use httpmock::MockServer;

use crate::tests::common::{json, mock_token, token_cache, TOKEN_PATH};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_trigger_single_exchange() {
    let cdek = MockServer::start_async().await;
    let oauth = cdek
        .mock_async(|when, then| {
            when.method(POST).path(TOKEN_PATH);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(json!({"access_token": "tok-shared", "expires_in": 3600}))
                .delay(Duration::from_millis(300));
        })
        .await;

    let cache = Arc::new(token_cache(&cdek, Duration::from_secs(3000)));
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_token().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "tok-shared");
    }
    assert_eq!(oauth.calls_async().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn token_is_refreshed_once_the_safety_window_passes() {
    let cdek = MockServer::start_async().await;
    let oauth = mock_token(&cdek, "tok-1").await;
    let window = Duration::from_millis(300);
    let cache = token_cache(&cdek, window);

    cache.get_token().await.unwrap();
    cache.get_token().await.unwrap();
    assert_eq!(oauth.calls_async().await, 1, "second call must be served from cache");

    tokio::time::sleep(window + Duration::from_millis(100)).await;
    cache.get_token().await.unwrap();
    cache.get_token().await.unwrap();
    assert_eq!(oauth.calls_async().await, 2);
}
