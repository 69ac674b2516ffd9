//! Request and result envelope types
//!
//! An `InsightResult` has the same shape whether it came from the live
//! prediction service or from a fallback policy. The only visible
//! difference is `note`/`degraded`.

mod payloads;
pub use payloads::*;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GatewayError;

/// Lookahead used by the prediction service when none is given
pub const DEFAULT_DAYS_AHEAD: u32 = 90;

/// The fixed set of operations the gateway forwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Demand,
    Payment,
    Insight,
    Query,
    Train,
    Status,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Demand,
        OperationKind::Payment,
        OperationKind::Insight,
        OperationKind::Query,
        OperationKind::Train,
        OperationKind::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Demand => "demand",
            OperationKind::Payment => "payment",
            OperationKind::Insight => "insight",
            OperationKind::Query => "query",
            OperationKind::Train => "train",
            OperationKind::Status => "status",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demand" => Ok(OperationKind::Demand),
            "payment" | "payments" => Ok(OperationKind::Payment),
            "insight" | "insights" => Ok(OperationKind::Insight),
            "query" => Ok(OperationKind::Query),
            "train" => Ok(OperationKind::Train),
            "status" => Ok(OperationKind::Status),
            _ => Err(GatewayError::UnknownOperation(s.to_string())),
        }
    }
}

/// Kind-specific inputs. Fields irrelevant to the chosen kind are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightParams {
    /// Purchasing budget for demand predictions
    #[serde(default)]
    pub budget: Option<f64>,

    /// Demand lookahead horizon in days
    #[serde(default)]
    pub days_ahead: Option<u32>,

    /// Free text for the query operation
    #[serde(default)]
    pub query: Option<String>,
}

impl InsightParams {
    pub fn demand(budget: Option<f64>, days_ahead: Option<u32>) -> Self {
        Self {
            budget,
            days_ahead,
            query: None,
        }
    }

    pub fn query(text: impl Into<String>) -> Self {
        Self {
            query: Some(text.into()),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<(), GatewayError> {
        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget < 0.0 {
                return Err(GatewayError::InvalidParams(format!(
                    "budget must be a non-negative number, got {}",
                    budget
                )));
            }
        }
        if self.days_ahead == Some(0) {
            return Err(GatewayError::InvalidParams("days_ahead must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// One validated ask for AI output
#[derive(Debug, Clone, PartialEq)]
pub struct InsightRequest {
    pub request_id: Uuid,
    pub business_id: String,
    pub kind: OperationKind,
    pub params: InsightParams,
    pub received_at: DateTime<Utc>,
}

impl InsightRequest {
    /// Validates caller input. The business id is trimmed and must be non-empty.
    pub fn new(
        kind: OperationKind,
        business_id: &str,
        params: InsightParams,
    ) -> Result<Self, GatewayError> {
        let business_id = business_id.trim();
        if business_id.is_empty() {
            return Err(GatewayError::MissingBusinessId);
        }
        params.validate()?;

        Ok(Self {
            request_id: Uuid::new_v4(),
            business_id: business_id.to_string(),
            kind,
            params,
            received_at: Utc::now(),
        })
    }

    pub fn days_ahead(&self) -> u32 {
        self.params.days_ahead.unwrap_or(DEFAULT_DAYS_AHEAD)
    }
}

/// Kind-tagged payload carried by every result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum InsightPayload {
    Demand(DemandPayload),
    Payment(PaymentPayload),
    Insight(InsightsPayload),
    Query(QueryPayload),
    Train(TrainPayload),
    Status(StatusPayload),
}

impl InsightPayload {
    pub fn kind(&self) -> OperationKind {
        match self {
            InsightPayload::Demand(_) => OperationKind::Demand,
            InsightPayload::Payment(_) => OperationKind::Payment,
            InsightPayload::Insight(_) => OperationKind::Insight,
            InsightPayload::Query(_) => OperationKind::Query,
            InsightPayload::Train(_) => OperationKind::Train,
            InsightPayload::Status(_) => OperationKind::Status,
        }
    }
}

/// Uniform response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightResult {
    pub success: bool,
    pub payload: InsightPayload,

    /// Present only on fallback results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub degraded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,

    /// Human-readable status line, mostly for failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    pub generated_at: DateTime<Utc>,
}

impl InsightResult {
    /// Wrap a validated payload from the live service
    pub fn live(payload: InsightPayload) -> Self {
        let (success, confidence, risk_level, message) = match &payload {
            InsightPayload::Demand(p) => (true, p.mean_confidence(), None, None),
            InsightPayload::Payment(p) => (true, None, Some(p.risk_assessment.overall_risk_level), None),
            InsightPayload::Insight(_) => (true, None, None, None),
            InsightPayload::Query(p) => (true, Some(p.confidence), None, None),
            InsightPayload::Train(p) => {
                let ok = !p.status.eq_ignore_ascii_case("failed");
                (ok, None, None, Some(p.message.clone()))
            }
            InsightPayload::Status(_) => (true, None, None, None),
        };

        Self {
            success,
            payload,
            note: None,
            degraded: false,
            confidence,
            risk_level,
            message,
            generated_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_parsing() {
        assert_eq!("DEMAND".parse::<OperationKind>().unwrap(), OperationKind::Demand);
        assert_eq!("payments".parse::<OperationKind>().unwrap(), OperationKind::Payment);
        assert_eq!(" insights ".parse::<OperationKind>().unwrap(), OperationKind::Insight);
        assert_eq!(
            "forecast".parse::<OperationKind>(),
            Err(GatewayError::UnknownOperation("forecast".to_string()))
        );
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_request_requires_business_id() {
        assert_eq!(
            InsightRequest::new(OperationKind::Demand, "   ", InsightParams::default()),
            Err(GatewayError::MissingBusinessId)
        );

        let request = InsightRequest::new(OperationKind::Demand, " biz-1 ", InsightParams::default()).unwrap();
        assert_eq!(request.business_id, "biz-1");
        assert_eq!(request.days_ahead(), DEFAULT_DAYS_AHEAD);
    }

    #[test]
    fn test_request_rejects_bad_budget() {
        for budget in [-1.0, f64::NAN, f64::INFINITY] {
            let result = InsightRequest::new(
                OperationKind::Demand,
                "biz-1",
                InsightParams::demand(Some(budget), None),
            );
            assert!(matches!(result, Err(GatewayError::InvalidParams(_))));
        }
    }

    #[test]
    fn test_payload_serializes_with_kind_tag() {
        let payload = InsightPayload::Query(QueryPayload {
            response: "Margins are healthy".to_string(),
            confidence: 0.9,
            data_sources: vec!["sales_data".to_string()],
            timestamp: None,
        });
        let value = serde_json::to_value(InsightResult::live(payload)).unwrap();

        assert_eq!(value["payload"]["kind"], "query");
        assert_eq!(value["payload"]["data"]["confidence"], 0.9);
        assert_eq!(value["degraded"], false);
        assert!(value.get("note").is_none());
    }
}
