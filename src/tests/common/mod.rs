// shared helpers for the in-crate integration tests
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use httpmock::Method::POST;
use httpmock::{Mock, MockServer};
use reqwest::Client;

use crate::cache::token_cache::TokenCache;
use crate::config::settings::MetricsConfig;
use crate::server::server::{router, AppState};
use crate::sources::oauth2::OAuth2Source;
use crate::upstream::gateway::CdekGateway;

pub const TOKEN_PATH: &str = "/v2/oauth/token";
pub const CITIES_PATH: &str = "/v2/location/cities";
pub const TARIFF_PATH: &str = "/v2/calculator/tariff";

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Token cache talking to the mocked OAuth endpoint of `cdek`.
pub fn token_cache(cdek: &MockServer, safety_window: Duration) -> TokenCache {
    TokenCache::new(
        OAuth2Source::new(build_reqwest_client(), cdek.url(TOKEN_PATH), "client-id", "client-secret"),
        safety_window,
    )
}

/// Full proxy wired to the mocked CDEK server.
pub async fn spawn_proxy(cdek: &MockServer, cors_origin: &str) -> (JoinHandle<()>, SocketAddr) {
    let state = AppState::new(
        Arc::new(token_cache(cdek, Duration::from_secs(50 * 60))),
        CdekGateway::new(build_reqwest_client(), cdek.url("/v2")),
        cors_origin,
    )
    .expect("app state");
    spawn_axum(router(state, &MetricsConfig::default())).await
}

pub async fn mock_token<'a>(cdek: &'a MockServer, token: &str) -> Mock<'a> {
    let body = json!({"access_token": token, "token_type": "bearer", "expires_in": 3600});
    cdek.mock_async(|when, then| {
        when.method(POST).path(TOKEN_PATH);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(body);
    })
    .await
}
