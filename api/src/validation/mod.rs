//! Input Validation Module
//!
//! This module provides validation and sanitization for data entering the
//! storefront API.
//!
//! # Overview
//!
//! 1. **Validators** - total predicates for emails, passwords and product records
//! 2. **Sanitizers** - markup stripping over arbitrary JSON values
//! 3. **Schema** - structural checks of API responses against a shape descriptor
//! 4. **Extractors** - `ValidatedJson<T>` for handlers
//!
//! None of the predicates panic: `null`, missing and mistyped values are
//! reported as invalid.
//!
//! # Usage
//!
//! ```ignore
//! use serde_json::json;
//! use crate::validation::{sanitize_input, validate_product_data};
//!
//! let product = sanitize_input(&json!({"id": "1", "title": "<b>Tee</b>"}));
//! assert!(validate_product_data(&product, Some(&["id", "title"][..])));
//! ```
//!
//! ## Validation Error Response
//!
//! `ValidatedJson` rejects with a 400 Bad Request:
//!
//! ```json
//! {
//!   "error": "ValidationError",
//!   "message": "Validation failed for field 'email'",
//!   "errors": [{"field": "email", "message": "must be a valid email address"}],
//!   "code": 400,
//!   "timestamp": "2026-02-20T10:30:00Z",
//!   "correlation_id": "uuid-here"
//! }
//! ```

pub mod extractors;
pub mod requests;
pub mod sanitizers;
pub mod schema;
pub mod validators;

pub use extractors::{FieldError, Validatable, ValidatedJson, ValidationBuilder, ValidationError};
pub use sanitizers::{normalize_email, sanitize_input, strip_markup, trim};
pub use schema::{validate_api_response, ApiResponseSchema};
pub use validators::{
    validate_email, validate_length, validate_password, validate_product_data,
    validate_required, PasswordPolicy,
};
