use anyhow::Result;
use prometheus::Registry;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::metrics;

pub const METRICS_PREFIX: &str = "pod";

pub struct Observability {
    pub registry: Registry,
}

impl Observability {
    /// Install the global subscriber and build the metrics registry
    pub fn init() -> Result<Self> {
        let registry = build_registry(METRICS_PREFIX)?;

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "pod_api=debug,tower_http=debug".into());

        let json_logs = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let fmt_layer = if json_logs {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        tracing::info!(json_logs, "Observability stack initialized (Prometheus + tracing)");
        Ok(Self { registry })
    }
}

/// Registry with every collector registered under `prefix`
pub fn build_registry(prefix: &str) -> Result<Registry> {
    let registry = Registry::new_custom(Some(prefix.into()), None)?;
    metrics::register_all(&registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_prefixed() {
        let registry = build_registry("test").unwrap();
        metrics::PRODUCTS_REJECTED.inc();
        let families = registry.gather();
        assert!(!families.is_empty());
        for fam in &families {
            assert!(
                fam.get_name().starts_with("test_"),
                "metric {} missing prefix",
                fam.get_name()
            );
        }
    }
}
