//! Validation implementations for API request types

use shared::models::SignupRequest;

use super::extractors::{FieldError, Validatable, ValidationBuilder};
use super::sanitizers::normalize_email;
use super::validators::{
    validate_email, validate_length, validate_password, validate_required, PasswordPolicy,
};

/// Maximum length for an email address
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum length for a password
const MAX_PASSWORD_LENGTH: usize = 128;

impl Validatable for SignupRequest {
    type Rules = PasswordPolicy;

    fn sanitize(&mut self) {
        // Passwords are taken verbatim; only the address is normalized.
        self.email = normalize_email(&self.email);
    }

    fn validate(&self, policy: &PasswordPolicy) -> Result<(), Vec<FieldError>> {
        let mut builder = ValidationBuilder::new();

        builder.check("email", || {
            validate_required(&self.email, "email")?;
            validate_length(&self.email, 3, MAX_EMAIL_LENGTH)?;
            if !validate_email(self.email.as_str()) {
                return Err("must be a valid email address".to_string());
            }
            Ok(())
        });

        builder.check("password", || {
            validate_required(&self.password, "password")?;
            validate_length(&self.password, 1, MAX_PASSWORD_LENGTH)?;
            if !validate_password(self.password.as_str(), policy) {
                return Err(password_requirements(policy));
            }
            Ok(())
        });

        builder.build()
    }
}

fn password_requirements(policy: &PasswordPolicy) -> String {
    let mut message = format!(
        "must be at least {} characters with upper and lower case letters and a digit",
        policy.min_length
    );
    if policy.require_special {
        message.push_str(", plus a special character");
    }
    message.push_str(", and must not be a common password");
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_sanitize_normalizes_email_only() {
        let mut req = request("  Shopper@Example.COM ", " StrongP@ss123 ");
        req.sanitize();
        assert_eq!(req.email, "shopper@example.com");
        assert_eq!(req.password, " StrongP@ss123 ");
    }

    #[test]
    fn test_valid_signup() {
        let req = request("shopper@example.com", "StrongP@ss123");
        assert!(req.validate(&PasswordPolicy::default()).is_ok());
    }

    #[test]
    fn test_invalid_signup_reports_both_fields() {
        let req = request("shopper@", "password");
        let errors = req.validate(&PasswordPolicy::default()).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[1].field, "password");
        assert!(errors[1].message.contains("special character"));
    }

    #[test]
    fn test_policy_without_special_characters() {
        let policy = PasswordPolicy {
            min_length: 6,
            require_special: false,
        };
        let req = request("shopper@example.com", "Password123");
        assert!(req.validate(&policy).is_ok());
        assert!(!password_requirements(&policy).contains("special"));
    }
}
