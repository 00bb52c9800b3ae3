//! Request pipeline security stages
//!
//! `security_headers` stamps the configured response headers on every
//! response. `validate_input` gates request bodies on the length and
//! character set of their canonical JSON form. Layer order on the router
//! must be: headers outermost, then input validation, then handlers, so
//! that rejections also carry the security headers.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{ConfigError, SecurityHeaders, ValidationRules};
use crate::metrics;

/// Pre-rendered security headers shared by every response
#[derive(Debug, Clone)]
pub struct HeaderSet(Arc<HeaderMap>);

impl HeaderSet {
    pub fn from_config(headers: &SecurityHeaders) -> Result<Self, ConfigError> {
        Ok(Self(Arc::new(headers.to_header_map()?)))
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.0
    }
}

/// Why a request body was refused
#[derive(Error, Debug)]
pub enum InputRejection {
    #[error("failed to read request body: {0}")]
    BodyRead(String),
    #[error("request body is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),
    #[error("input exceeds maximum length: {length} > {max}")]
    TooLong { length: usize, max: usize },
    #[error("input contains invalid character {character:?} at offset {offset}")]
    DisallowedCharacter { character: char, offset: usize },
}

impl InputRejection {
    /// Low-cardinality label for metrics
    pub fn reason(&self) -> &'static str {
        match self {
            InputRejection::BodyRead(_) => "body_read",
            InputRejection::MalformedJson(_) => "malformed_json",
            InputRejection::TooLong { .. } => "too_long",
            InputRejection::DisallowedCharacter { .. } => "disallowed_character",
        }
    }
}

pub async fn security_headers(
    State(header_set): State<HeaderSet>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in header_set.headers() {
        headers.insert(name.clone(), value.clone());
    }
    response
}

pub async fn validate_input(
    State(rules): State<Arc<ValidationRules>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let (parts, body) = request.into_parts();

    let bytes = match axum::body::to_bytes(body, rules.body_limit_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => return reject(InputRejection::BodyRead(e.to_string()), &method, &path),
    };

    if !bytes.is_empty() {
        if let Err(rejection) = check_body(&bytes, &rules) {
            return reject(rejection, &method, &path);
        }
    }

    next.run(Request::from_parts(parts, Body::from(bytes)))
        .await
}

/// Check a raw body against the rules using its canonical JSON form
pub fn check_body(bytes: &Bytes, rules: &ValidationRules) -> Result<(), InputRejection> {
    let value: Value = serde_json::from_slice(bytes)?;
    let canonical = serde_json::to_string(&value)?;

    let length = canonical.chars().count();
    if length > rules.input_max_length {
        return Err(InputRejection::TooLong {
            length,
            max: rules.input_max_length,
        });
    }

    if let Some((offset, character)) = rules.allowed_characters.first_disallowed(&canonical) {
        return Err(InputRejection::DisallowedCharacter { character, offset });
    }

    Ok(())
}

fn reject(rejection: InputRejection, method: &axum::http::Method, path: &str) -> Response {
    tracing::error!(
        %method,
        path,
        reason = rejection.reason(),
        error = %rejection,
        "Input validation failed"
    );
    metrics::observe_rejection(rejection.reason());
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Invalid input" })),
    )
        .into_response()
}
