//! Security layer for the print-on-demand storefront API

pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod monitoring;
pub mod observability;
pub mod routes;
pub mod security_middleware;
pub mod state;
pub mod validation;
