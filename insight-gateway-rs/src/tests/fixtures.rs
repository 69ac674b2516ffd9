//! Canned prediction service responses and gateway builders

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::MockServer;

use crate::audit::MemoryAuditSink;
use crate::config::GatewayConfig;
use crate::gateway::InsightGateway;
use crate::upstream::HttpPredictionClient;

pub const TEST_API_KEY: &str = "test-api-key";

/// Nothing listens here; connections are refused immediately
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1";

pub fn gateway_for_url(base_url: &str, request_timeout: Duration) -> (InsightGateway, Arc<MemoryAuditSink>) {
    let config = GatewayConfig::new(base_url)
        .with_request_timeout(request_timeout)
        .with_audit_timeout(Duration::from_millis(200))
        .with_api_key(TEST_API_KEY);
    let upstream = HttpPredictionClient::new(&config).unwrap();
    let audit = Arc::new(MemoryAuditSink::new());

    let gateway = InsightGateway::new(config, Arc::new(upstream), audit.clone());
    (gateway, audit)
}

pub fn gateway_for(server: &MockServer) -> (InsightGateway, Arc<MemoryAuditSink>) {
    gateway_for_url(&server.uri(), Duration::from_secs(5))
}

pub fn demand_response() -> Value {
    json!({
        "predictions": [
            {
                "item_name": "Rice 25kg",
                "predicted_demand_30d": 120.0,
                "predicted_demand_60d": 250.0,
                "predicted_demand_90d": 390.0,
                "avg_daily_demand": 4.1,
                "confidence": 0.82,
                "reason": "Strong seasonal pattern before holidays",
                "investment_required": 600.0,
                "expected_profit": 180.0,
                "roi_percentage": 30.0
            },
            {
                "item_name": "Cooking oil 5L",
                "predicted_demand_30d": 80.0,
                "predicted_demand_60d": 150.0,
                "predicted_demand_90d": 230.0,
                "avg_daily_demand": 2.6,
                "confidence": 0.68,
                "reason": "Stable weekly demand"
            }
        ],
        "recommendations": [
            {
                "type": "budget_allocation",
                "title": "Budget allocation plan",
                "description": "Allocate 1000 across 2 items",
                "priority": "high",
                "total_investment": 1000.0,
                "expected_profit": 260.0,
                "roi": 26.0
            }
        ],
        "timestamp": "2026-10-01T08:00:00"
    })
}

pub fn payment_response() -> Value {
    json!({
        "recommendations": [
            {
                "customer_id": 17,
                "customer_name": "Kedai Sinar",
                "recommended_payment": 450.0,
                "recommended_frequency": "monthly",
                "risk_level": "high",
                "risk_score": 7.5,
                "payment_history_score": 0.35,
                "avg_payment_days": 48.0,
                "priority": "urgent"
            }
        ],
        "risk_assessment": {
            "overall_risk_level": "high",
            "total_customers": 3,
            "high_risk_count": 1,
            "medium_risk_count": 1,
            "low_risk_count": 1,
            "risk_percentage": 33.3,
            "recommendations": ["Tighten credit terms for late payers"]
        },
        "timestamp": "2026-10-01T08:00:00"
    })
}

pub fn query_response(answer: &str) -> Value {
    json!({
        "response": answer,
        "confidence": 0.74,
        "data_sources": ["sales_data", "expense_data"],
        "timestamp": "2026-10-01T08:00:00"
    })
}

pub fn status_response() -> Value {
    json!({
        "company_id": 9,
        "demand_model": {"is_trained": true, "last_trained": "2026-09-30T22:00:00", "model_accuracy": 0.87},
        "payment_model": {"is_trained": false, "last_trained": null},
        "business_model": {"is_trained": true, "last_trained": "2026-09-30T22:00:00"},
        "timestamp": "2026-10-01T08:00:00"
    })
}
