//! Per-operation payload schemas
//!
//! These mirror what the prediction service returns for each endpoint. A
//! body that does not deserialize into the matching type, or that fails
//! `validate`, is treated as an upstream failure.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ServiceError};

/// Schema invariants checked after deserialization
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn check_unit_interval(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ServiceError::validation(format!("{} must be within [0, 1], got {}", field, value)))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ServiceError::validation(format!("{} must be a non-negative number, got {}", field, value)))
    }
}

fn check_optional_non_negative(field: &str, value: Option<f64>) -> Result<()> {
    value.map_or(Ok(()), |v| check_non_negative(field, v))
}

/// Three-level scale shared by risk and priority fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Priority attached to recommendations and insights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

// ---------------------------------------------------------------------------
// Demand
// ---------------------------------------------------------------------------

/// Predicted demand for one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPrediction {
    pub item_name: String,
    pub predicted_demand_30d: f64,
    pub predicted_demand_60d: f64,
    pub predicted_demand_90d: f64,
    pub avg_daily_demand: f64,
    pub confidence: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment_required: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi_percentage: Option<f64>,
}

/// Actionable advice derived from a set of predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecommendation {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_investment: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandPayload {
    pub predictions: Vec<DemandPrediction>,
    #[serde(default)]
    pub recommendations: Vec<DemandRecommendation>,
    /// Aggregate profit estimate for the supplied budget
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_profit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Validate for DemandPayload {
    fn validate(&self) -> Result<()> {
        if self.predictions.is_empty() {
            return Err(ServiceError::validation("demand response contained no predictions"));
        }
        for prediction in &self.predictions {
            if prediction.item_name.trim().is_empty() {
                return Err(ServiceError::validation("demand prediction is missing item_name"));
            }
            check_unit_interval("confidence", prediction.confidence)?;
            check_non_negative("predicted_demand_30d", prediction.predicted_demand_30d)?;
            check_non_negative("predicted_demand_60d", prediction.predicted_demand_60d)?;
            check_non_negative("predicted_demand_90d", prediction.predicted_demand_90d)?;
            check_non_negative("avg_daily_demand", prediction.avg_daily_demand)?;
            check_optional_non_negative("investment_required", prediction.investment_required)?;
        }
        Ok(())
    }
}

impl DemandPayload {
    /// Mean confidence over all predictions
    pub fn mean_confidence(&self) -> Option<f64> {
        if self.predictions.is_empty() {
            return None;
        }
        let total: f64 = self.predictions.iter().map(|p| p.confidence).sum();
        Some(total / self.predictions.len() as f64)
    }
}

// ---------------------------------------------------------------------------
// Payment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecommendation {
    pub customer_id: serde_json::Value,
    pub customer_name: String,
    pub recommended_payment: f64,
    pub recommended_frequency: String,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_history_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_payment_days: Option<f64>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Aggregate risk tally over a business's customers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_risk_level: RiskLevel,
    pub total_customers: u32,
    pub high_risk_count: u32,
    pub medium_risk_count: u32,
    pub low_risk_count: u32,
    pub risk_percentage: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub recommendations: Vec<PaymentRecommendation>,
    pub risk_assessment: RiskAssessment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Validate for PaymentPayload {
    fn validate(&self) -> Result<()> {
        if self.recommendations.is_empty() {
            return Err(ServiceError::validation("payment response contained no recommendations"));
        }
        for rec in &self.recommendations {
            check_non_negative("recommended_payment", rec.recommended_payment)?;
            check_non_negative("risk_score", rec.risk_score)?;
            if let Some(score) = rec.payment_history_score {
                check_unit_interval("payment_history_score", score)?;
            }
        }

        let risk = &self.risk_assessment;
        let tally = u64::from(risk.high_risk_count)
            + u64::from(risk.medium_risk_count)
            + u64::from(risk.low_risk_count);
        if tally > u64::from(risk.total_customers) {
            return Err(ServiceError::validation(format!(
                "risk tally {} exceeds total customers {}",
                tally, risk.total_customers
            )));
        }
        if !(risk.risk_percentage.is_finite() && (0.0..=100.0).contains(&risk.risk_percentage)) {
            return Err(ServiceError::validation(format!(
                "risk_percentage must be within [0, 100], got {}",
                risk.risk_percentage
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Business insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInsight {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_potential: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSummary {
    pub overall_health: String,
    pub health_score: f64,
    #[serde(default)]
    pub key_recommendations: Vec<String>,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsPayload {
    pub insights: Vec<BusinessInsight>,
    pub summary: BusinessSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Validate for InsightsPayload {
    fn validate(&self) -> Result<()> {
        if self.insights.is_empty() {
            return Err(ServiceError::validation("insight response contained no insights"));
        }
        let score = self.summary.health_score;
        if !(score.is_finite() && (0.0..=100.0).contains(&score)) {
            return Err(ServiceError::validation(format!(
                "health_score must be within [0, 100], got {}",
                score
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Free-text query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
    pub response: String,
    pub confidence: f64,
    #[serde(default)]
    pub data_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Validate for QueryPayload {
    fn validate(&self) -> Result<()> {
        if self.response.trim().is_empty() {
            return Err(ServiceError::validation("query response was empty"));
        }
        check_unit_interval("confidence", self.confidence)
    }
}

// ---------------------------------------------------------------------------
// Administrative: training and model status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainPayload {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_model: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_model: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_model: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Validate for TrainPayload {
    fn validate(&self) -> Result<()> {
        if self.status.trim().is_empty() {
            return Err(ServiceError::validation("training response is missing status"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub is_trained: bool,
    #[serde(default)]
    pub last_trained: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_accuracy: Option<f64>,
}

impl ModelStatus {
    pub fn untrained() -> Self {
        Self {
            is_trained: false,
            last_trained: None,
            model_accuracy: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub demand_model: ModelStatus,
    pub payment_model: ModelStatus,
    pub business_model: ModelStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Validate for StatusPayload {
    fn validate(&self) -> Result<()> {
        for (name, model) in [
            ("demand_model", &self.demand_model),
            ("payment_model", &self.payment_model),
            ("business_model", &self.business_model),
        ] {
            if let Some(accuracy) = model.model_accuracy {
                check_unit_interval(&format!("{}.model_accuracy", name), accuracy)?;
            }
        }
        Ok(())
    }
}
