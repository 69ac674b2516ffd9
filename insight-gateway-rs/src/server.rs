//! HTTP controller for the insight gateway
//!
//! Thin axum layer: it parses the request, hands it to `InsightGateway` and
//! serializes whatever comes back. Fallback results are ordinary 200s.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::GatewayError;
use crate::gateway::InsightGateway;
use crate::models::{InsightParams, InsightResult, OperationKind};

pub const SERVICE_NAME: &str = "insight-gateway";

/// Shared handler state
#[derive(Debug)]
pub struct AppState {
    pub gateway: InsightGateway,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(gateway: InsightGateway) -> Self {
        Self {
            gateway,
            started_at: Instant::now(),
        }
    }
}

/// Body of `POST /api/insights/:kind`
#[derive(Debug, Default, Deserialize)]
pub struct InsightRequestBody {
    #[serde(default)]
    pub business_id: Option<String>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub days_ahead: Option<u32>,
    #[serde(default)]
    pub query: Option<String>,
}

impl InsightRequestBody {
    fn params(&self) -> InsightParams {
        InsightParams {
            budget: self.budget,
            days_ahead: self.days_ahead,
            query: self.query.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service_name: String,
    pub upstream_healthy: bool,
    pub uptime_seconds: u64,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/insights/status/:business_id", get(status_handler))
        .route("/api/insights/:kind", post(insight_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// POST /api/insights/:kind
async fn insight_handler(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    body: Result<Json<InsightRequestBody>, JsonRejection>,
) -> Result<Json<InsightResult>, GatewayError> {
    let Json(body) = body.map_err(|rejection| GatewayError::InvalidParams(rejection.body_text()))?;
    let result = state
        .gateway
        .request_insight_str(&kind, body.business_id.as_deref(), body.params())
        .await?;
    Ok(Json(result))
}

/// GET /api/insights/status/:business_id
async fn status_handler(
    State(state): State<Arc<AppState>>,
    Path(business_id): Path<String>,
) -> Result<Json<InsightResult>, GatewayError> {
    let result = state
        .gateway
        .request_insight(OperationKind::Status, &business_id, InsightParams::default())
        .await?;
    Ok(Json(result))
}

/// GET /health
///
/// The gateway stays healthy when the prediction service is down; it is
/// serving fallbacks in that case.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        service_name: SERVICE_NAME.to_string(),
        upstream_healthy: state.gateway.upstream_healthy().await,
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "operations": OperationKind::ALL.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "endpoints": [
            "GET /health",
            "POST /api/insights/:kind",
            "GET /api/insights/status/:business_id"
        ]
    }))
}
