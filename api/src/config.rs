//! Security configuration
//!
//! Loaded once from the environment at startup and shared read-only
//! behind an `Arc` for the life of the process.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use lazy_static::lazy_static;
use regex::Regex;
use shared::SanitizationLevel;
use thiserror::Error;
use tracing::info;

use crate::validation::PasswordPolicy;

pub const DEFAULT_INPUT_MAX_LENGTH: usize = 1000;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;
pub const DEFAULT_MONITORING_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_PORT: u16 = 3001;

/// Character class (without brackets) a serialized request body may draw from
pub const DEFAULT_ALLOWED_CHARACTERS: &str = r#"a-zA-Z0-9\s\-_.,;!?@#$%^&*(){}\[\]":'/+=\\"#;

pub const DEFAULT_CSP: &str = "default-src 'none'; script-src 'self'; style-src 'self'; \
     img-src 'self'; connect-src 'self'; font-src 'self'; object-src 'none'; \
     media-src 'none'; frame-src 'none'";

lazy_static! {
    static ref DEFAULT_DISALLOWED: Regex =
        Regex::new(&format!("[^{DEFAULT_ALLOWED_CHARACTERS}]")).unwrap();
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid allowed character class `{class}`: {reason}")]
    InvalidCharacterClass { class: String, reason: String },
    #[error("Invalid header value for {header}: {value}")]
    InvalidHeader { header: &'static str, value: String },
}

/// Whitelist of characters accepted in a serialized request body
#[derive(Debug, Clone)]
pub struct AllowedCharacters {
    class: String,
    disallowed: Regex,
}

impl AllowedCharacters {
    /// Compile a character class body such as `a-zA-Z0-9\s`
    pub fn new(class: &str) -> Result<Self, ConfigError> {
        if class.is_empty() {
            return Err(ConfigError::InvalidCharacterClass {
                class: class.to_string(),
                reason: "class is empty".to_string(),
            });
        }
        if let Some(offset) = unbalanced_close(class) {
            return Err(ConfigError::InvalidCharacterClass {
                class: class.to_string(),
                reason: format!("unescaped `]` at offset {offset} ends the class early"),
            });
        }
        let disallowed = Regex::new(&format!("[^{class}]")).map_err(|e| {
            ConfigError::InvalidCharacterClass {
                class: class.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            class: class.to_string(),
            disallowed,
        })
    }

    /// Byte offset and value of the first character outside the class
    pub fn first_disallowed(&self, input: &str) -> Option<(usize, char)> {
        let m = self.disallowed.find(input)?;
        input[m.start()..].chars().next().map(|c| (m.start(), c))
    }

    pub fn permits(&self, input: &str) -> bool {
        self.first_disallowed(input).is_none()
    }

    pub fn as_str(&self) -> &str {
        &self.class
    }
}

impl Default for AllowedCharacters {
    fn default() -> Self {
        Self {
            class: DEFAULT_ALLOWED_CHARACTERS.to_string(),
            disallowed: DEFAULT_DISALLOWED.clone(),
        }
    }
}

/// Byte offset of a `]` that would close the surrounding `[^...]`
fn unbalanced_close(class: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut chars = class.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' => depth += 1,
            ']' if depth == 0 => return Some(i),
            ']' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Request body gating rules
#[derive(Debug, Clone)]
pub struct ValidationRules {
    pub input_max_length: usize,
    pub allowed_characters: AllowedCharacters,
    /// Carried for operators; the sanitizer behaves the same at every level.
    pub sanitization_level: SanitizationLevel,
    pub body_limit_bytes: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            input_max_length: DEFAULT_INPUT_MAX_LENGTH,
            allowed_characters: AllowedCharacters::default(),
            sanitization_level: SanitizationLevel::High,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

/// A single Content-Security-Policy directive and its sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CspDirective {
    pub name: String,
    pub sources: Vec<String>,
}

impl CspDirective {
    pub fn new(name: impl Into<String>, sources: &[&str]) -> Self {
        Self {
            name: name.into(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn render(&self) -> String {
        if self.sources.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.sources.join(" "))
        }
    }
}

/// Parse `default-src 'none'; script-src 'self'` into ordered directives
pub fn parse_csp(raw: &str) -> Result<Vec<CspDirective>, ConfigError> {
    let directives: Vec<CspDirective> = raw
        .split(';')
        .filter_map(|part| {
            let mut tokens = part.split_whitespace();
            let name = tokens.next()?;
            Some(CspDirective {
                name: name.to_string(),
                sources: tokens.map(str::to_string).collect(),
            })
        })
        .collect();

    if directives.is_empty() {
        return Err(ConfigError::InvalidConfig(
            "content security policy has no directives".to_string(),
        ));
    }
    Ok(directives)
}

/// Response headers attached to every outgoing response
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    pub content_security_policy: Vec<CspDirective>,
    pub strict_transport_security: String,
    pub x_frame_options: String,
    pub x_content_type_options: String,
    pub referrer_policy: String,
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self {
            content_security_policy: parse_csp(DEFAULT_CSP).unwrap_or_default(),
            strict_transport_security: "max-age=31536000; includeSubDomains".to_string(),
            x_frame_options: "DENY".to_string(),
            x_content_type_options: "nosniff".to_string(),
            referrer_policy: "strict-origin-when-cross-origin".to_string(),
        }
    }
}

impl SecurityHeaders {
    /// `name sources; name sources` in configured order
    pub fn content_security_policy_value(&self) -> String {
        self.content_security_policy
            .iter()
            .map(CspDirective::render)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Render every header once so per-request insertion cannot fail
    pub fn to_header_map(&self) -> Result<HeaderMap, ConfigError> {
        let entries: [(HeaderName, &'static str, String); 5] = [
            (
                header::CONTENT_SECURITY_POLICY,
                "Content-Security-Policy",
                self.content_security_policy_value(),
            ),
            (
                header::STRICT_TRANSPORT_SECURITY,
                "Strict-Transport-Security",
                self.strict_transport_security.clone(),
            ),
            (
                header::X_FRAME_OPTIONS,
                "X-Frame-Options",
                self.x_frame_options.clone(),
            ),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                "X-Content-Type-Options",
                self.x_content_type_options.clone(),
            ),
            (
                header::REFERRER_POLICY,
                "Referrer-Policy",
                self.referrer_policy.clone(),
            ),
        ];

        let mut map = HeaderMap::with_capacity(entries.len());
        for (name, label, value) in entries {
            let header_value =
                HeaderValue::from_str(&value).map_err(|_| ConfigError::InvalidHeader {
                    header: label,
                    value: value.clone(),
                })?;
            map.insert(name, header_value);
        }
        Ok(map)
    }
}

/// Periodic security monitoring settings
#[derive(Debug, Clone)]
pub struct MonitoringConfig {
    pub interval: Duration,
    pub watch_paths: Vec<PathBuf>,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_MONITORING_INTERVAL_SECS),
            watch_paths: Vec::new(),
        }
    }
}

/// Full security configuration for the API process
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub validation: ValidationRules,
    pub headers: SecurityHeaders,
    pub password: PasswordPolicy,
    pub monitoring: MonitoringConfig,
    /// Hex-encoded 32-byte key; a random key is generated when absent.
    pub encryption_key: Option<String>,
    pub port: u16,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            validation: ValidationRules::default(),
            headers: SecurityHeaders::default(),
            password: PasswordPolicy::default(),
            monitoring: MonitoringConfig::default(),
            encryption_key: None,
            port: DEFAULT_PORT,
        }
    }
}

impl SecurityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let input_max_length = env_parse("SECURITY_INPUT_MAX_LENGTH", DEFAULT_INPUT_MAX_LENGTH)?;
        if input_max_length == 0 {
            return Err(ConfigError::InvalidConfig(
                "SECURITY_INPUT_MAX_LENGTH must be greater than zero".to_string(),
            ));
        }

        let allowed_characters = match env::var("SECURITY_ALLOWED_CHARACTERS") {
            Ok(class) => AllowedCharacters::new(&class)?,
            Err(_) => AllowedCharacters::default(),
        };

        let sanitization_level = env::var("SECURITY_SANITIZATION_LEVEL")
            .unwrap_or_else(|_| "high".to_string())
            .parse::<SanitizationLevel>()
            .map_err(ConfigError::InvalidConfig)?;

        let body_limit_bytes = env_parse("SECURITY_BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT_BYTES)?;

        let defaults = SecurityHeaders::default();
        let content_security_policy = match env::var("SECURITY_CSP") {
            Ok(raw) => parse_csp(&raw)?,
            Err(_) => defaults.content_security_policy,
        };
        let headers = SecurityHeaders {
            content_security_policy,
            strict_transport_security: env::var("SECURITY_HSTS")
                .unwrap_or(defaults.strict_transport_security),
            x_frame_options: env::var("SECURITY_FRAME_OPTIONS").unwrap_or(defaults.x_frame_options),
            x_content_type_options: env::var("SECURITY_CONTENT_TYPE_OPTIONS")
                .unwrap_or(defaults.x_content_type_options),
            referrer_policy: env::var("SECURITY_REFERRER_POLICY")
                .unwrap_or(defaults.referrer_policy),
        };
        // Fail at startup rather than on the first response.
        headers.to_header_map()?;

        let password = PasswordPolicy {
            min_length: env_parse("PASSWORD_MIN_LENGTH", PasswordPolicy::default().min_length)?,
            require_special: env_parse(
                "PASSWORD_REQUIRE_SPECIAL",
                PasswordPolicy::default().require_special,
            )?,
        };

        let interval_secs = env_parse("MONITORING_INTERVAL_SECS", DEFAULT_MONITORING_INTERVAL_SECS)?;
        if interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "MONITORING_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }
        let watch_paths = env::var("MONITORING_WATCH_PATHS")
            .map(|raw| parse_path_list(&raw))
            .unwrap_or_default();

        let encryption_key = env::var("ENCRYPTION_KEY").ok().filter(|k| !k.trim().is_empty());
        let port = env_parse("PORT", DEFAULT_PORT)?;

        info!(
            input_max_length,
            body_limit_bytes,
            sanitization_level = %sanitization_level,
            csp_directives = headers.content_security_policy.len(),
            password_min_length = password.min_length,
            monitoring_interval_secs = interval_secs,
            watched_files = watch_paths.len(),
            "Security configuration loaded"
        );

        Ok(Self {
            validation: ValidationRules {
                input_max_length,
                allowed_characters,
                sanitization_level,
                body_limit_bytes,
            },
            headers,
            password,
            monitoring: MonitoringConfig {
                interval: Duration::from_secs(interval_secs),
                watch_paths,
            },
            encryption_key,
            port,
        })
    }
}

fn parse_path_list(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

fn env_parse<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|e| {
            ConfigError::InvalidConfig(format!("Invalid value for {key} (`{raw}`): {e}"))
        }),
        Err(_) => Ok(default),
    }
}
