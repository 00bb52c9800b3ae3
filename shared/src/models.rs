use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════
// SECURITY CONFIGURATION TYPES
// ═══════════════════════════════════════════════════════════════════════════

/// How aggressively untrusted input is cleaned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizationLevel {
    Low,
    Medium,
    #[default]
    High,
}

impl std::fmt::Display for SanitizationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SanitizationLevel::Low => write!(f, "low"),
            SanitizationLevel::Medium => write!(f, "medium"),
            SanitizationLevel::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for SanitizationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(SanitizationLevel::Low),
            "medium" => Ok(SanitizationLevel::Medium),
            "high" => Ok(SanitizationLevel::High),
            other => Err(format!("unknown sanitization level: {other}")),
        }
    }
}

/// Output of a symmetric encryption: hex-encoded ciphertext, IV and auth tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionResult {
    pub encrypted: String,
    pub iv: String,
    pub tag: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// MONITORING
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Success,
    Failure,
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckStatus::Success => write!(f, "success"),
            CheckStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Outcome of a single periodic security check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringCheck {
    #[serde(rename = "type")]
    pub check_type: String,
    pub status: CheckStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl MonitoringCheck {
    pub fn success(check_type: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            check_type: check_type.into(),
            status: CheckStatus::Success,
            timestamp: Utc::now(),
            details,
        }
    }

    pub fn failure(check_type: impl Into<String>, details: Option<serde_json::Value>) -> Self {
        Self {
            check_type: check_type.into(),
            status: CheckStatus::Failure,
            timestamp: Utc::now(),
            details,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// REQUEST TYPES
// ═══════════════════════════════════════════════════════════════════════════

/// Account sign-up form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

/// Field names a product record must carry unless the caller narrows the set
pub const DEFAULT_PRODUCT_FIELDS: [&str; 5] = ["id", "title", "price", "thumbnail", "shopifyUrl"];
