use axum::routing::get;
use axum::{response::IntoResponse, Router};
use http::{header::CONTENT_TYPE, StatusCode};
use prometheus::TextEncoder;
use tracing::error;

use crate::config::settings::MetricsConfig;
use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;

pub fn router(metrics_config: &MetricsConfig) -> Router<AppState> {
    let mut router = Router::new();
    if metrics_config.is_enabled {
        router = router.route(metrics_config.path.as_str(), get(render_metrics));
    }
    router
}

async fn render_metrics() -> impl IntoResponse {
    let metrics = get_metrics().await;
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry.gather();

    let mut buffer = String::new();
    if let Err(e) = encoder.encode_utf8(&metric_families, &mut buffer) {
        error!("failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, [(CONTENT_TYPE, "text/plain")], e.to_string());
    }

    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        buffer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::server::server::{router as app_router, AppState};
    use crate::tests::common::{build_reqwest_client, spawn_axum, token_cache};
    use crate::upstream::gateway::CdekGateway;

    async fn spawn_with_metrics(cdek: &MockServer, is_enabled: bool) -> (tokio::task::JoinHandle<()>, std::net::SocketAddr) {
        let state = AppState::new(
            Arc::new(token_cache(cdek, Duration::from_secs(60))),
            CdekGateway::new(build_reqwest_client(), cdek.url("/v2")),
            "*",
        )
        .unwrap();
        let config = MetricsConfig {
            path: "/metrics".to_string(),
            is_enabled,
        };
        spawn_axum(app_router(state, &config)).await
    }

    #[tokio::test]
    async fn metrics_route_serves_text_format_when_enabled() {
        let cdek = MockServer::start_async().await;
        get_metrics().await.token_cache_hits.inc();
        let (handle, addr) = spawn_with_metrics(&cdek, true).await;

        let response = build_reqwest_client()
            .get(format!("http://{}/metrics", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = response.text().await.unwrap();
        assert!(text.contains("cdekproxy_token_cache_hits_total"));
        handle.abort();
    }

    #[tokio::test]
    async fn metrics_route_absent_when_disabled() {
        let cdek = MockServer::start_async().await;
        let (handle, addr) = spawn_with_metrics(&cdek, false).await;

        let response = build_reqwest_client()
            .get(format!("http://{}/metrics", addr))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        handle.abort();
    }
}
