//! Field validators for input validation
//!
//! Predicates never panic and never mutate their input: anything that is
//! missing, mistyped or malformed is simply reported as invalid.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use shared::DEFAULT_PRODUCT_FIELDS;

lazy_static! {
    /// local@label.label[.label...] with no whitespace and a single '@'
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9.+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)+$").unwrap();
}

/// Passwords rejected outright regardless of composition
const WEAK_PASSWORDS: &[&str] = &[
    "password",
    "password1",
    "password123",
    "Password1",
    "Password1!",
    "Password123!",
    "P@ssw0rd",
    "P@ssword1",
    "Passw0rd!",
    "12345678",
    "123456789",
    "1234567890",
    "qwerty123",
    "Qwerty123!",
    "letmein",
    "Welcome1!",
    "Admin123!",
    "abc12345",
    "iloveyou",
    "11111111",
];

/// Password strength requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_special: true,
        }
    }
}

/// Validate an email address shape: `local@domain.tld`
pub fn validate_email<'a>(value: impl Into<Option<&'a str>>) -> bool {
    match value.into() {
        Some(email) if !email.is_empty() => EMAIL_REGEX.is_match(email),
        _ => false,
    }
}

/// Validate password strength against a policy
pub fn validate_password<'a>(value: impl Into<Option<&'a str>>, policy: &PasswordPolicy) -> bool {
    let Some(password) = value.into() else {
        return false;
    };
    if password.is_empty() || password.chars().count() < policy.min_length {
        return false;
    }
    if WEAK_PASSWORDS.contains(&password) {
        return false;
    }

    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    has_upper && has_lower && has_digit && (has_special || !policy.require_special)
}

/// Validate that a product record carries every required field
///
/// A field counts as present when it exists and is neither `null` nor an
/// empty string. When `price` is required it must also be numeric.
pub fn validate_product_data(product: &Value, required_fields: Option<&[&str]>) -> bool {
    let Some(record) = product.as_object() else {
        return false;
    };
    let required = required_fields.unwrap_or(&DEFAULT_PRODUCT_FIELDS);

    required.iter().all(|&field| match record.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) if s.is_empty() => false,
        Some(value) if field == "price" => is_numeric(value),
        Some(_) => true,
    })
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().map(f64::is_finite).unwrap_or(false),
        _ => false,
    }
}

/// Validate that a string is not empty after trimming
pub fn validate_required(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field_name));
    }
    Ok(())
}

/// Validate string length within bounds
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        return Err(format!("must be at least {} characters", min));
    }
    if len > max {
        return Err(format!("must be at most {} characters", max));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("user.name+tag@example.co.uk"));
        assert!(validate_email("user-name@subdomain.example.org"));

        assert!(!validate_email("user@"));
        assert!(!validate_email("user@.com"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@example"));
        assert!(!validate_email("user name@example.com"));
        assert!(!validate_email("user@exa mple.com"));
        assert!(!validate_email("user@@example.com"));
        assert!(!validate_email("a@b@example.com"));
        assert!(!validate_email("user@example."));
        assert!(!validate_email(""));
        assert!(!validate_email(None::<&str>));
    }

    #[test]
    fn test_validate_password_default_policy() {
        let policy = PasswordPolicy::default();
        assert!(validate_password("StrongP@ss123", &policy));
        assert!(validate_password("Another$3cureP@ss", &policy));

        assert!(!validate_password("password", &policy));
        assert!(!validate_password("12345678", &policy));
        assert!(!validate_password("abcdefgh", &policy));
        assert!(!validate_password("ABCDEFGH", &policy));
        assert!(!validate_password("Pass1", &policy));
        assert!(!validate_password("Password123", &policy));
        assert!(!validate_password("", &policy));
        assert!(!validate_password(None::<&str>, &policy));
    }

    #[test]
    fn test_validate_password_blocklist_is_exact() {
        let policy = PasswordPolicy::default();
        assert!(!validate_password("Password123!", &policy));
        assert!(validate_password("Password123!x", &policy));
    }

    #[test]
    fn test_validate_password_custom_policy() {
        let policy = PasswordPolicy {
            min_length: 6,
            require_special: false,
        };
        assert!(validate_password("Password123", &policy));
        assert!(!validate_password("Pass1", &policy));
        assert!(!validate_password("password123", &policy));
    }

    #[test]
    fn test_validate_password_counts_characters_not_bytes() {
        let policy = PasswordPolicy::default();
        // 7 characters, more than 8 bytes
        assert!(!validate_password("Ää1!Ööx", &policy));
    }

    #[test]
    fn test_validate_product_data() {
        let product = json!({
            "id": "123",
            "title": "Test Product",
            "price": 19.99,
            "thumbnail": "https://example.com/image.jpg",
            "shopifyUrl": "https://shop.example.com/product/123"
        });
        assert!(validate_product_data(&product, None));

        let mut missing_title = product.clone();
        missing_title.as_object_mut().unwrap().remove("title");
        assert!(!validate_product_data(&missing_title, None));

        let mut empty_id = product.clone();
        empty_id["id"] = json!("");
        assert!(!validate_product_data(&empty_id, None));

        let mut null_thumbnail = product;
        null_thumbnail["thumbnail"] = Value::Null;
        assert!(!validate_product_data(&null_thumbnail, None));
    }

    #[test]
    fn test_validate_product_data_custom_fields() {
        let product = json!({
            "id": "123",
            "title": "Test Product",
            "shopifyUrl": "https://shop.example.com/product/123"
        });
        assert!(validate_product_data(&product, Some(&["id", "title"][..])));
        assert!(!validate_product_data(&product, Some(&["id", "title", "thumbnail"][..])));
        assert!(validate_product_data(&product, Some(&[][..])));
    }

    #[test]
    fn test_validate_product_data_price_and_shape() {
        assert!(validate_product_data(&json!({"price": "24.50"}), Some(&["price"][..])));
        assert!(validate_product_data(&json!({"price": 0}), Some(&["price"][..])));
        assert!(!validate_product_data(&json!({"price": "free"}), Some(&["price"][..])));
        assert!(!validate_product_data(&json!({"price": true}), Some(&["price"][..])));

        assert!(!validate_product_data(&json!([]), Some(&[][..])));
        assert!(!validate_product_data(&Value::Null, None));
        assert!(!validate_product_data(&json!("id"), Some(&["id"][..])));
    }

    #[test]
    fn test_validate_length() {
        assert!(validate_length("hello", 1, 10).is_ok());
        assert!(validate_length("", 1, 10).is_err());
        assert!(validate_length("hello world!", 1, 5).is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("value", "email").is_ok());
        assert_eq!(validate_required("   ", "email").unwrap_err(), "email is required");
    }
}
