use once_cell::sync::Lazy;
use prometheus::{
    opts, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Registry, TextEncoder,
};

macro_rules! counter_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| IntCounterVec::new(opts!($name, $help), $labels).unwrap())
    };
}
macro_rules! histogram_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| {
            HistogramVec::new(HistogramOpts::new($name, $help).buckets(LATENCY_BUCKETS.to_vec()), $labels)
                .unwrap()
        })
    };
}
macro_rules! counter {
    ($name:expr, $help:expr) => {
        Lazy::new(|| IntCounter::new($name, $help).unwrap())
    };
}

const LATENCY_BUCKETS: [f64; 10] = [0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0];

// ── HTTP ────────────────────────────────────────────────────────────────────
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("http_requests_total", "Total HTTP requests", &["method", "status"]);
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> =
    histogram_vec!("http_request_duration_seconds", "HTTP request latency", &["method"]);

// ── Input validation ────────────────────────────────────────────────────────
pub static INPUT_REJECTIONS: Lazy<IntCounterVec> = counter_vec!(
    "input_rejections_total",
    "Request bodies rejected by the input validation stage",
    &["reason"]
);
pub static PRODUCTS_ACCEPTED: Lazy<IntCounter> =
    counter!("products_accepted_total", "Product submissions that passed validation");
pub static PRODUCTS_REJECTED: Lazy<IntCounter> =
    counter!("products_rejected_total", "Product submissions missing required fields");

// ── Monitoring ──────────────────────────────────────────────────────────────
pub static SECURITY_CHECKS: Lazy<IntCounterVec> = counter_vec!(
    "security_checks_total",
    "Periodic security check outcomes",
    &["check", "status"]
);

pub fn register_all(r: &Registry) -> prometheus::Result<()> {
    r.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    r.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    r.register(Box::new(INPUT_REJECTIONS.clone()))?;
    r.register(Box::new(PRODUCTS_ACCEPTED.clone()))?;
    r.register(Box::new(PRODUCTS_REJECTED.clone()))?;
    r.register(Box::new(SECURITY_CHECKS.clone()))?;
    Ok(())
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

pub fn observe_http(method: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method])
        .observe(duration_secs);
}

pub fn observe_rejection(reason: &str) {
    INPUT_REJECTIONS.with_label_values(&[reason]).inc();
}

pub fn observe_security_check(check: &str, status: &str) {
    SECURITY_CHECKS.with_label_values(&[check, status]).inc();
}
