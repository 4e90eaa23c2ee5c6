use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{middleware, Router};
use reqwest::Client;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cache::token_cache::TokenCache;
use crate::config::settings::{MetricsConfig, SettingsConfig};
use crate::observability::{metrics::get_metrics, routes as metrics_routes};
use crate::server::{cors, handlers, shutdown};
use crate::sources::oauth2::OAuth2Source;
use crate::upstream::gateway::CdekGateway;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub token_cache: Arc<TokenCache>,
    pub gateway: CdekGateway,
    pub cors_origin: HeaderValue,
}

impl AppState {
    pub fn new(token_cache: Arc<TokenCache>, gateway: CdekGateway, cors_origin: &str) -> Result<Self> {
        let cors_origin = HeaderValue::from_str(cors_origin)
            .with_context(|| format!("invalid CORS origin '{}'", cors_origin))?;
        Ok(Self {
            token_cache,
            gateway,
            cors_origin,
        })
    }

    /// Wire the token cache and the gateway over one HTTP client.
    pub fn from_settings(settings: &SettingsConfig) -> Result<Self> {
        let cdek = &settings.cdek;
        let client = Client::builder()
            .timeout(Duration::from_millis(cdek.timeout_ms))
            .build()
            .context("failed to build HTTP client")?;

        let token_cache = TokenCache::new(
            OAuth2Source::from_settings(&client, cdek),
            Duration::from_secs(cdek.safety_window_seconds),
        );
        let gateway = CdekGateway::from_settings(&client, cdek);
        Self::new(Arc::new(token_cache), gateway, &settings.cors.origin)
    }
}

pub fn router(state: AppState, metrics_config: &MetricsConfig) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/cities", get(handlers::cities))
        .route("/calc", post(handlers::calc))
        .merge(metrics_routes::router(metrics_config))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), cors::apply_cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the proxy until SIGINT/SIGTERM.
pub async fn start(settings: &SettingsConfig) -> Result<()> {
    if !settings.cdek.has_credentials() {
        warn!("CDEK client credentials are not configured; token requests will be rejected");
    }

    let state = AppState::from_settings(settings)?;
    let app = router(state, &settings.metrics);

    let bind_addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("cdek-proxy listening on {}", listener.local_addr()?);

    let metrics = get_metrics().await;
    metrics.up.set(1);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::signal())
        .await
        .context("server error")?;
    metrics.up.set(0);

    info!("cdek-proxy stopped");
    Ok(())
}
