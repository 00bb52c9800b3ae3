use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;
use prometheus::Registry;

use crate::config::{ConfigError, SecurityConfig, ValidationRules};
use crate::crypto::CryptoService;
use crate::security_middleware::HeaderSet;
use crate::validation::PasswordPolicy;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SecurityConfig>,
    pub rules: Arc<ValidationRules>,
    pub headers: HeaderSet,
    pub crypto: CryptoService,
    pub registry: Registry,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: SecurityConfig,
        crypto: CryptoService,
        registry: Registry,
    ) -> Result<Self, ConfigError> {
        let headers = HeaderSet::from_config(&config.headers)?;
        Ok(Self {
            rules: Arc::new(config.validation.clone()),
            config: Arc::new(config),
            headers,
            crypto,
            registry,
            started_at: Instant::now(),
        })
    }
}

impl FromRef<AppState> for PasswordPolicy {
    fn from_ref(state: &AppState) -> Self {
        state.config.password
    }
}
