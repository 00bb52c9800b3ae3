//! Structural validation of API responses
//!
//! Schemas use the familiar JSON shape
//! `{"type": "object", "required": [...], "properties": {...}}` /
//! `{"type": "array", "items": {...}}` / `{"type": "string"}` and are
//! parsed into [`ApiResponseSchema`] before any response is inspected,
//! so a malformed schema is rejected up front.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApiResponseSchema {
    Object {
        #[serde(default)]
        required: Vec<String>,
        #[serde(default)]
        properties: BTreeMap<String, ApiResponseSchema>,
    },
    Array {
        #[serde(default)]
        items: Option<Box<ApiResponseSchema>>,
    },
    String,
    Number,
    Boolean,
}

impl ApiResponseSchema {
    /// Parse a schema from its JSON form
    pub fn from_value(schema: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(schema)
    }

    /// Check `value` against this schema
    pub fn validate(&self, value: &Value) -> bool {
        match (self, value) {
            (ApiResponseSchema::Object { required, properties }, Value::Object(map)) => {
                required.iter().all(|field| map.contains_key(field))
                    && properties.iter().all(|(name, schema)| {
                        map.get(name).map_or(true, |field| schema.validate(field))
                    })
            }
            (ApiResponseSchema::Array { items }, Value::Array(elements)) => match items {
                Some(schema) => elements.iter().all(|element| schema.validate(element)),
                None => true,
            },
            (ApiResponseSchema::String, Value::String(_)) => true,
            (ApiResponseSchema::Number, Value::Number(_)) => true,
            (ApiResponseSchema::Boolean, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

/// Validate a response against a JSON schema description
///
/// Returns `false` for a malformed schema as well as for a mismatching
/// response.
pub fn validate_api_response(response: &Value, schema: &Value) -> bool {
    match ApiResponseSchema::from_value(schema) {
        Ok(schema) => schema.validate(response),
        Err(e) => {
            tracing::debug!(error = %e, "rejecting response: schema is malformed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn posts_schema() -> Value {
        json!({
            "type": "object",
            "required": ["posts"],
            "properties": {
                "posts": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["id", "platform"],
                        "properties": {
                            "id": { "type": "string" },
                            "platform": { "type": "string" },
                            "status": { "type": "string" }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_valid_response() {
        let response = json!({
            "posts": [
                { "id": "1", "platform": "instagram", "status": "scheduled" },
                { "id": "2", "platform": "facebook", "status": "published" }
            ]
        });
        assert!(validate_api_response(&response, &posts_schema()));
        assert!(validate_api_response(&json!({"posts": []}), &posts_schema()));
    }

    #[test]
    fn test_missing_required_top_level_field() {
        assert!(!validate_api_response(&json!({"data": []}), &posts_schema()));
    }

    #[test]
    fn test_missing_required_item_field() {
        let response = json!({"posts": [{"platform": "instagram"}]});
        assert!(!validate_api_response(&response, &posts_schema()));
    }

    #[test]
    fn test_wrong_primitive_type() {
        let response = json!({"posts": [{"id": 123, "platform": "instagram"}]});
        assert!(!validate_api_response(&response, &posts_schema()));

        let optional_wrong = json!({"posts": [{"id": "1", "platform": "x", "status": 5}]});
        assert!(!validate_api_response(&optional_wrong, &posts_schema()));
    }

    #[test]
    fn test_structural_mismatch() {
        assert!(!validate_api_response(&json!([]), &posts_schema()));
        assert!(!validate_api_response(&Value::Null, &posts_schema()));
        assert!(!validate_api_response(&json!({"posts": {}}), &posts_schema()));
        assert!(!validate_api_response(&json!({}), &json!({"type": "array"})));
    }

    #[test]
    fn test_primitives() {
        assert!(validate_api_response(&json!(true), &json!({"type": "boolean"})));
        assert!(validate_api_response(&json!(1.5), &json!({"type": "number"})));
        assert!(!validate_api_response(&json!("1.5"), &json!({"type": "number"})));
        assert!(!validate_api_response(&json!(null), &json!({"type": "string"})));
    }

    #[test]
    fn test_array_without_items_accepts_any_elements() {
        let schema = json!({"type": "array"});
        assert!(validate_api_response(&json!([1, "two", null]), &schema));
    }

    #[test]
    fn test_malformed_schema_is_false() {
        let response = json!({"posts": []});
        assert!(!validate_api_response(&response, &json!("object")));
        assert!(!validate_api_response(&response, &json!({"type": "tuple"})));
        assert!(!validate_api_response(&response, &json!({"required": ["posts"]})));
        assert!(!validate_api_response(&response, &json!({"type": "object", "required": "posts"})));
        assert!(!validate_api_response(&response, &Value::Null));
    }

    #[test]
    fn test_parsed_schema_shape() {
        let schema = ApiResponseSchema::from_value(&json!({"type": "array", "items": {"type": "string"}}))
            .unwrap();
        assert_eq!(
            schema,
            ApiResponseSchema::Array {
                items: Some(Box::new(ApiResponseSchema::String))
            }
        );
    }
}
