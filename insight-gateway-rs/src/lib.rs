//! # Insight Gateway
//!
//! Degrading gateway in front of an AI prediction service.
//!
//! Callers ask for one of six operations (demand prediction, payment
//! recommendations, business insights, free-text query, training, model
//! status) for a business. The gateway makes a single bounded call to the
//! prediction service and always answers:
//!
//! - with the live payload when the service responds in time with a body
//!   that passes schema validation, or
//! - with a clearly labelled fallback (`note` set, `degraded = true`) for
//!   every other outcome.
//!
//! Every invocation is recorded through an `AuditSink`, best-effort.

pub mod audit;
pub use audit::{AuditRecord, AuditSink, JsonlAuditSink, MemoryAuditSink, TracingAuditSink};

pub mod config;
pub use config::{ConfigProvider, EnvConfigProvider, GatewayConfig, MemoryConfigProvider, ServerConfig};

pub mod error;
pub use error::{AuditError, GatewayError, ServiceError};

pub mod fallback;
pub use fallback::FallbackPolicy;

pub mod gateway;
pub use gateway::InsightGateway;

pub mod logging;

pub mod models;
pub use models::{InsightParams, InsightPayload, InsightRequest, InsightResult, OperationKind};

pub mod server;

pub mod upstream;
pub use upstream::{HttpPredictionClient, PredictionService};

mod util;

/// Gateway over HTTP for the given configuration, auditing to the log
pub fn insight_gateway(config: GatewayConfig) -> Result<InsightGateway, GatewayError> {
    InsightGateway::from_config(config)
}

#[cfg(test)]
mod tests;
