use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers, metrics, security_middleware, state::AppState};

pub fn observability_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(handlers::metrics_endpoint))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health_check))
}

pub fn product_routes() -> Router<AppState> {
    Router::new().route("/api/products", post(handlers::create_product))
}

pub fn account_routes() -> Router<AppState> {
    Router::new().route("/api/accounts/validate", post(handlers::validate_account))
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin([HeaderValue::from_static("http://localhost:3000")])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Full application router
///
/// Security headers wrap everything so that rejections, CORS preflights
/// and 404s carry them too. Input validation sits directly around the
/// handlers.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(observability_routes())
        .merge(product_routes())
        .merge(account_routes())
        .fallback(handlers::route_not_found)
        .layer(middleware::from_fn_with_state(
            state.rules.clone(),
            security_middleware::validate_input,
        ))
        .layer(cors())
        .layer(middleware::from_fn(request_logger))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(
            state.headers.clone(),
            security_middleware::security_headers,
        ))
        .with_state(state)
}

pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status().as_u16();
    metrics::observe_http(method.as_str(), status, elapsed.as_secs_f64());

    tracing::info!("{method} {uri} {status} {}ms", elapsed.as_millis());

    response
}
