//! Upstream prediction service abstraction
//!
//! The gateway talks to the prediction service through `PredictionService`
//! so tests and alternative transports can stand in for the HTTP client.

mod http;
pub use http::HttpPredictionClient;

use async_trait::async_trait;
use reqwest::Method;

use crate::error::Result;
use crate::models::{InsightPayload, InsightRequest, OperationKind};

/// A source of AI output for one business
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Perform exactly one call for `request` and return a validated payload
    async fn call(&self, request: &InsightRequest) -> Result<InsightPayload>;

    /// Whether the service reports itself healthy
    async fn health(&self) -> Result<bool>;

    fn name(&self) -> &str {
        "prediction-service"
    }
}

/// HTTP method and path segments for each operation
pub fn route(kind: OperationKind, business_id: &str) -> (Method, Vec<&str>) {
    match kind {
        OperationKind::Demand => (Method::POST, vec!["predict", "demand"]),
        OperationKind::Payment => (Method::POST, vec!["recommend", "payments"]),
        OperationKind::Insight => (Method::POST, vec!["insights", "business"]),
        OperationKind::Query => (Method::POST, vec!["query"]),
        OperationKind::Train => (Method::POST, vec!["train"]),
        OperationKind::Status => (Method::GET, vec!["status", business_id]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routes() {
        assert_eq!(route(OperationKind::Demand, "b1"), (Method::POST, vec!["predict", "demand"]));
        assert_eq!(route(OperationKind::Payment, "b1").1, vec!["recommend", "payments"]);
        assert_eq!(route(OperationKind::Status, "b1"), (Method::GET, vec!["status", "b1"]));
    }
}
