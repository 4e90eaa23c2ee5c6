use axum::http::StatusCode;
use reqwest::Client;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::settings::CdekConfig;
use crate::error::{ProxyError, Result};
use crate::observability::metrics::{get_metrics, ENDPOINT_CITIES, ENDPOINT_TARIFF};
use crate::upstream::types::{CityFilter, TariffPayload, TariffQuote};

/// Authenticated calls to the CDEK REST API.
#[derive(Clone)]
pub struct CdekGateway {
    client: Client,
    api_base: String,
}

impl CdekGateway {
    pub fn new(client: Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_owned();
        Self { client, api_base }
    }

    pub fn from_settings(client: &Client, cfg: &CdekConfig) -> Self {
        Self::new(client.clone(), cfg.api_base.as_str())
    }

    /// City directory lookup. The body is relayed as-is; a non-success
    /// upstream status is returned verbatim, any success becomes 200.
    pub async fn lookup_cities(&self, token: &str, filter: &CityFilter) -> Result<(StatusCode, Value)> {
        let url = format!("{}/location/cities", self.api_base);
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&filter.query_pairs())
            .send()
            .await?;
        let status = response.status();
        record(ENDPOINT_CITIES, status, start).await;
        debug!("GET {} -> {}", url, status);

        let body: Value = response.json().await?;
        if status.is_success() {
            Ok((StatusCode::OK, body))
        } else {
            warn!("city lookup answered {}", status);
            Ok((status, body))
        }
    }

    /// Tariff calculation for a single package.
    pub async fn calculate_tariff(&self, token: &str, payload: &TariffPayload) -> Result<TariffQuote> {
        let url = format!("{}/calculator/tariff", self.api_base);
        let start = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(payload)
            .send()
            .await?;
        let status = response.status();
        record(ENDPOINT_TARIFF, status, start).await;
        debug!("POST {} -> {}", url, status);

        let body: Value = response.json().await?;
        if !status.is_success() {
            warn!("tariff calculator answered {}", status);
            return Err(ProxyError::Upstream { status, body });
        }
        Ok(TariffQuote::from_body(&body))
    }
}

async fn record(endpoint: &str, status: StatusCode, start: Instant) {
    let metrics = get_metrics().await;
    metrics
        .upstream_requests
        .with_label_values(&[endpoint, status.as_str()])
        .inc();
    metrics
        .upstream_duration
        .with_label_values(&[endpoint])
        .observe(start.elapsed().as_secs_f64());
}
