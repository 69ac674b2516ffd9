//! # Insight Gateway
//!
//! Single entry point for AI output. Each invocation makes exactly one
//! bounded call to the prediction service and always resolves to an
//! `InsightResult`: the live payload when the service answers with a valid
//! body in time, otherwise the fallback for the requested kind. Only caller
//! misuse is reported as an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use metrics::{counter, histogram};
use tokio::time::timeout;
use tracing::{debug, info_span, warn, Instrument};

use crate::audit::{AuditRecord, AuditSink, TracingAuditSink};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, ServiceError};
use crate::fallback::FallbackPolicy;
use crate::models::{InsightParams, InsightPayload, InsightRequest, InsightResult, OperationKind};
use crate::upstream::{HttpPredictionClient, PredictionService};

/// Orchestrates prediction calls, fallbacks and auditing
#[derive(Clone)]
pub struct InsightGateway {
    config: GatewayConfig,
    upstream: Arc<dyn PredictionService>,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for InsightGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightGateway")
            .field("config", &self.config)
            .field("upstream", &self.upstream.name())
            .finish()
    }
}

impl InsightGateway {
    pub fn new(
        config: GatewayConfig,
        upstream: Arc<dyn PredictionService>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            config,
            upstream,
            audit,
        }
    }

    /// HTTP prediction client with audit records going to the log
    pub fn from_config(config: GatewayConfig) -> Result<Self, GatewayError> {
        let upstream = HttpPredictionClient::new(&config)?;
        Ok(Self::new(config, Arc::new(upstream), Arc::new(TracingAuditSink)))
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Obtain AI output for one business.
    ///
    /// Returns `Err` only for caller misuse, before any network traffic.
    /// Upstream failures of any sort produce a fallback result instead.
    pub async fn request_insight(
        &self,
        kind: OperationKind,
        business_id: &str,
        params: InsightParams,
    ) -> Result<InsightResult, GatewayError> {
        let request = InsightRequest::new(kind, business_id, params)?;

        let span = info_span!(
            "insight_request",
            request_id = %request.request_id,
            business_id = %request.business_id,
            kind = request.kind.as_str(),
        );

        Ok(self.fulfil(request).instrument(span).await)
    }

    /// Same as `request_insight`, for callers holding untyped input
    pub async fn request_insight_str(
        &self,
        kind: &str,
        business_id: Option<&str>,
        params: InsightParams,
    ) -> Result<InsightResult, GatewayError> {
        let kind: OperationKind = kind.parse()?;
        let business_id = business_id.ok_or(GatewayError::MissingBusinessId)?;
        self.request_insight(kind, business_id, params).await
    }

    /// Never errors; an unreachable or slow service reads as unhealthy
    pub async fn upstream_healthy(&self) -> bool {
        match timeout(self.config.request_timeout, self.upstream.health()).await {
            Ok(Ok(healthy)) => healthy,
            Ok(Err(e)) => {
                debug!(error = %e, "prediction service health check failed");
                false
            }
            Err(_) => {
                debug!("prediction service health check timed out");
                false
            }
        }
    }

    async fn fulfil(&self, request: InsightRequest) -> InsightResult {
        let kind = request.kind.as_str();
        counter!("insight_gateway.requests", 1, "kind" => kind);

        let started = Instant::now();
        let outcome = self.call_upstream(&request).await;
        histogram!(
            "insight_gateway.upstream.duration_ms",
            started.elapsed().as_secs_f64() * 1000.0,
            "kind" => kind
        );

        let result = match outcome {
            Ok(payload) => {
                counter!("insight_gateway.result.live", 1, "kind" => kind);
                debug!("prediction service answered");
                InsightResult::live(payload)
            }
            Err(error) => {
                counter!(
                    "insight_gateway.result.fallback", 1,
                    "kind" => kind,
                    "reason" => error.category()
                );
                warn!(
                    error = %error,
                    category = error.category(),
                    "prediction service unavailable, serving fallback"
                );
                FallbackPolicy::for_kind(request.kind).generate(&request)
            }
        };

        self.append_audit(&request, &result, started.elapsed()).await;
        result
    }

    /// One outbound call. A timeout drops the in-flight future, so a late
    /// response is never observed.
    async fn call_upstream(&self, request: &InsightRequest) -> Result<InsightPayload, ServiceError> {
        match timeout(self.config.request_timeout, self.upstream.call(request)).await {
            Ok(Ok(payload)) if payload.kind() == request.kind => Ok(payload),
            Ok(Ok(payload)) => Err(ServiceError::validation(format!(
                "expected {} payload, got {}",
                request.kind,
                payload.kind()
            ))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ServiceError::timeout(format!(
                "no response within {}ms",
                self.config.request_timeout.as_millis()
            ))),
        }
    }

    async fn append_audit(&self, request: &InsightRequest, result: &InsightResult, elapsed: Duration) {
        let record = AuditRecord {
            request_id: request.request_id,
            business_id: request.business_id.clone(),
            kind: request.kind,
            success: !result.degraded,
            degraded: result.degraded,
            latency_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
        };

        match timeout(self.config.audit_timeout, self.audit.record(&record)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                counter!("insight_gateway.audit.failure", 1, "kind" => request.kind.as_str());
                warn!(error = %e, "failed to append audit record");
            }
            Err(_) => {
                counter!("insight_gateway.audit.failure", 1, "kind" => request.kind.as_str());
                warn!(
                    timeout_ms = self.config.audit_timeout.as_millis() as u64,
                    "audit append timed out"
                );
            }
        }
    }
}
