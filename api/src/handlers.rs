use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use shared::{SignupRequest, DEFAULT_PRODUCT_FIELDS};

use crate::{
    error::{ApiError, ApiResult},
    metrics,
    state::AppState,
    validation::{sanitize_input, validate_product_data, ValidatedJson},
};

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let uptime = state.started_at.elapsed().as_secs();
    let now = chrono::Utc::now().to_rfc3339();

    tracing::debug!(uptime_secs = uptime, "health check passed");
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": now,
            "uptime_secs": uptime,
            "sanitization_level": state.config.validation.sanitization_level,
        })),
    )
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let body = metrics::gather_metrics(&state.registry);
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}

/// Sanitize a submitted product and check it carries every catalogue field
pub async fn create_product(Json(payload): Json<Value>) -> ApiResult<(StatusCode, Json<Value>)> {
    let product = sanitize_input(&payload);

    if !validate_product_data(&product, None) {
        metrics::PRODUCTS_REJECTED.inc();
        let missing = missing_product_fields(&product);
        tracing::warn!(?missing, "product rejected");
        return Err(ApiError::bad_request(
            "InvalidProduct",
            if missing.is_empty() {
                "Product must be a JSON object".to_string()
            } else {
                format!("Missing or invalid fields: {}", missing.join(", "))
            },
        ));
    }

    metrics::PRODUCTS_ACCEPTED.inc();
    tracing::info!(id = %product["id"], "product accepted");
    Ok((StatusCode::CREATED, Json(product)))
}

fn missing_product_fields(product: &Value) -> Vec<&'static str> {
    if !product.is_object() {
        return Vec::new();
    }
    DEFAULT_PRODUCT_FIELDS
        .iter()
        .copied()
        .filter(|field| !validate_product_data(product, Some(&[*field][..])))
        .collect()
}

pub async fn validate_account(
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> Json<Value> {
    tracing::info!(email = %request.email, "account details validated");
    Json(json!({ "email": request.email, "valid": true }))
}

pub async fn route_not_found() -> impl IntoResponse {
    ApiError::not_found("RouteNotFound", "Route not found")
}
