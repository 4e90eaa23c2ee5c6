use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::debug;

use crate::error::{ProxyError, Result};
use crate::server::server::AppState;
use crate::upstream::types::{CalcRequest, CityFilter, ServiceInfo, TariffResponse};

pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Repeated query keys keep their first value instead of failing the request.
pub async fn cities(
    State(state): State<AppState>,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Response> {
    let Query(pairs) = query.map_err(|rejection| ProxyError::Validation(rejection.body_text()))?;
    let filter = CityFilter::from_pairs(pairs);

    let token = state.token_cache.get_token().await?;
    let (status, body) = state.gateway.lookup_cities(&token, &filter).await?;
    Ok((status, Json(body)).into_response())
}

/// Validation runs before the token cache is touched.
pub async fn calc(
    State(state): State<AppState>,
    body: std::result::Result<Json<CalcRequest>, JsonRejection>,
) -> Result<Json<TariffResponse>> {
    let request = body.map(|Json(request)| request).unwrap_or_else(|rejection| {
        debug!("unreadable calc body: {}", rejection.body_text());
        CalcRequest::default()
    });
    let payload = request.to_payload()?;

    let token = state.token_cache.get_token().await?;
    let quote = state.gateway.calculate_tariff(&token, &payload).await?;
    Ok(Json(TariffResponse { ok: true, quote }))
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "ok": false, "error": "not found" })),
    )
}
