// tests/security_middleware_tests.rs
// End-to-end tests for the security pipeline through the full router

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use pod_api::{
    config::{parse_csp, SecurityConfig, SecurityHeaders, ValidationRules},
    crypto::CryptoService,
    observability::build_registry,
    routes,
    state::AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn app_with(config: SecurityConfig) -> Router {
    let registry = build_registry("it").unwrap();
    let state = AppState::new(config, CryptoService::random(), registry).unwrap();
    routes::app(state)
}

fn app() -> Router {
    app_with(SecurityConfig::default())
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_security_headers(response: &Response) {
    let headers = response.headers();
    for name in [
        header::CONTENT_SECURITY_POLICY,
        header::STRICT_TRANSPORT_SECURITY,
        header::X_FRAME_OPTIONS,
        header::X_CONTENT_TYPE_OPTIONS,
        header::REFERRER_POLICY,
    ] {
        assert!(headers.contains_key(&name), "missing {name}");
    }
}

fn product() -> Value {
    json!({
        "id": "tee-1",
        "title": "Blue Tee",
        "price": 19.99,
        "thumbnail": "https://cdn.example.com/tee.png",
        "shopifyUrl": "https://shop.example.com/products/tee-1"
    })
}

#[tokio::test]
async fn compliant_product_is_created() {
    let response = app()
        .oneshot(post("/api/products", &product().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_security_headers(&response);
    let body = json_body(response).await;
    assert_eq!(body["title"], "Blue Tee");
    assert_eq!(body["price"], "19.99");
}

#[tokio::test]
async fn incomplete_product_is_rejected_by_handler() {
    let response = app()
        .oneshot(post("/api/products", r#"{"id":"tee-1","title":"Blue Tee"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_security_headers(&response);
    assert!(response.headers().contains_key("x-correlation-id"));
    let body = json_body(response).await;
    assert_eq!(body["error"], "InvalidProduct");
    assert!(body["message"].as_str().unwrap().contains("price"));
}

#[tokio::test]
async fn oversized_body_is_rejected_before_handler() {
    let config = SecurityConfig {
        validation: ValidationRules {
            input_max_length: 40,
            ..ValidationRules::default()
        },
        ..SecurityConfig::default()
    };
    let response = app_with(config)
        .oneshot(post("/api/products", &product().to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_security_headers(&response);
    assert_eq!(json_body(response).await, json!({"error": "Invalid input"}));
}

#[tokio::test]
async fn markup_in_body_is_rejected() {
    let mut payload = product();
    payload["title"] = json!("<script>alert(1)</script>Tee");

    let response = app()
        .oneshot(post("/api/products", &payload.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "Invalid input"}));
}

#[tokio::test]
async fn non_json_body_is_rejected() {
    let response = app()
        .oneshot(post("/api/products", "title=Blue+Tee"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"error": "Invalid input"}));
}

#[tokio::test]
async fn get_requests_without_body_pass() {
    let response = app().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_security_headers(&response);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["sanitization_level"], "high");
}

#[tokio::test]
async fn unknown_route_is_json_404_with_headers() {
    let response = app().oneshot(get("/api/orders")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_security_headers(&response);
    assert_eq!(json_body(response).await["error"], "RouteNotFound");
}

#[tokio::test]
async fn custom_csp_is_rendered_in_order() {
    let config = SecurityConfig {
        headers: SecurityHeaders {
            content_security_policy: parse_csp(
                "default-src 'self'; img-src 'self' https://cdn.example.com",
            )
            .unwrap(),
            x_frame_options: "SAMEORIGIN".to_string(),
            ..SecurityHeaders::default()
        },
        ..SecurityConfig::default()
    };
    let response = app_with(config).oneshot(get("/health")).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get(header::CONTENT_SECURITY_POLICY).unwrap(),
        "default-src 'self'; img-src 'self' https://cdn.example.com"
    );
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "SAMEORIGIN");
}

#[tokio::test]
async fn invalid_header_config_fails_state_construction() {
    let config = SecurityConfig {
        headers: SecurityHeaders {
            strict_transport_security: "max-age=1\r\n".to_string(),
            ..SecurityHeaders::default()
        },
        ..SecurityConfig::default()
    };
    let registry = build_registry("bad").unwrap();
    assert!(AppState::new(config, CryptoService::random(), registry).is_err());
}

#[tokio::test]
async fn metrics_endpoint_reports_rejections() {
    let app = app();
    let response = app
        .clone()
        .oneshot(post("/api/products", r#"{"title":"~"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("it_input_rejections_total"));
    assert!(text.contains("disallowed_character"));
}
