//! # Fallback Policies
//!
//! Deterministic substitutes for each operation kind, used whenever the
//! prediction service cannot produce a valid answer. This is the cold-start
//! path: a business with no history gets conservative, clearly labelled
//! benchmark output instead of an error.
//!
//! `FallbackPolicy::for_kind` is an exhaustive match, so adding an
//! operation kind without a policy does not compile. Generators are pure
//! functions of the request; the only clock they read is
//! `InsightRequest::received_at`.

use crate::models::{
    BusinessInsight, BusinessSummary, DemandPayload, DemandPrediction, DemandRecommendation,
    InsightPayload, InsightRequest, InsightResult, InsightsPayload, ModelStatus, OperationKind,
    PaymentPayload, PaymentRecommendation, Priority, QueryPayload, RiskAssessment, RiskLevel,
    StatusPayload, TrainPayload,
};

/// Share of the budget reported as expected profit in degraded mode
pub const BENCHMARK_PROFIT_RATIO: f64 = 0.30;

pub const DEMAND_NOTE: &str =
    "AI service unavailable: showing industry benchmark estimates, not predictions for your business";
pub const PAYMENT_NOTE: &str =
    "AI service unavailable: recommendation uses standard default payment terms";
pub const INSIGHT_NOTE: &str =
    "AI service unavailable: showing general best-practice insights";
pub const QUERY_NOTE: &str = "AI service unavailable: query could not be answered";
pub const TRAIN_NOTE: &str = "AI service unavailable: training was not started";
pub const STATUS_NOTE: &str = "AI service unavailable: model status could not be retrieved";

pub const QUERY_APOLOGY: &str =
    "Sorry, I can't answer that right now. The AI service is temporarily unavailable; please try again later.";

/// Signature shared by every fallback generator
pub type FallbackGenerator = fn(&InsightRequest) -> InsightResult;

/// Substitute computation for one operation kind
#[derive(Clone, Copy)]
pub struct FallbackPolicy {
    pub kind: OperationKind,
    pub note: &'static str,
    generator: FallbackGenerator,
}

impl std::fmt::Debug for FallbackPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackPolicy")
            .field("kind", &self.kind)
            .field("note", &self.note)
            .finish()
    }
}

impl FallbackPolicy {
    pub fn for_kind(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Demand => Self {
                kind,
                note: DEMAND_NOTE,
                generator: demand_fallback,
            },
            OperationKind::Payment => Self {
                kind,
                note: PAYMENT_NOTE,
                generator: payment_fallback,
            },
            OperationKind::Insight => Self {
                kind,
                note: INSIGHT_NOTE,
                generator: insight_fallback,
            },
            OperationKind::Query => Self {
                kind,
                note: QUERY_NOTE,
                generator: query_fallback,
            },
            OperationKind::Train => Self {
                kind,
                note: TRAIN_NOTE,
                generator: train_fallback,
            },
            OperationKind::Status => Self {
                kind,
                note: STATUS_NOTE,
                generator: status_fallback,
            },
        }
    }

    /// Produce the substitute result. Always marked degraded with a note.
    pub fn generate(&self, request: &InsightRequest) -> InsightResult {
        let mut result = (self.generator)(request);
        result.degraded = true;
        result.note = Some(self.note.to_string());
        result
    }
}

fn degraded(request: &InsightRequest, success: bool, payload: InsightPayload) -> InsightResult {
    InsightResult {
        success,
        payload,
        note: None,
        degraded: true,
        confidence: None,
        risk_level: None,
        message: None,
        generated_at: request.received_at,
    }
}

fn timestamp(request: &InsightRequest) -> Option<String> {
    Some(request.received_at.to_rfc3339())
}

fn benchmark_item(name: &str, monthly_demand: f64, confidence: f64) -> DemandPrediction {
    DemandPrediction {
        item_name: name.to_string(),
        predicted_demand_30d: monthly_demand,
        predicted_demand_60d: monthly_demand * 2.0,
        predicted_demand_90d: monthly_demand * 3.0,
        avg_daily_demand: monthly_demand / 30.0,
        confidence,
        reason: "Estimated from industry benchmark demand for new businesses".to_string(),
        investment_required: None,
        expected_profit: None,
        roi_percentage: None,
    }
}

// The requested lookahead is not consulted; the list is a fixed illustration.
fn demand_fallback(request: &InsightRequest) -> InsightResult {
    let predictions = vec![
        benchmark_item("Best-selling product (benchmark)", 100.0, 0.5),
        benchmark_item("Seasonal product (benchmark)", 60.0, 0.4),
    ];

    let expected_profit = request.params.budget.map(|budget| budget * BENCHMARK_PROFIT_RATIO);

    let mut recommendations = Vec::new();
    match (request.params.budget, expected_profit) {
        (Some(budget), Some(profit)) => recommendations.push(DemandRecommendation {
            kind: "budget_allocation".to_string(),
            title: format!("Benchmark budget allocation for {:.0}", budget),
            description: "Spread the budget across proven sellers until enough sales history is recorded"
                .to_string(),
            priority: Some(Priority::Medium),
            total_investment: Some(budget),
            expected_profit: Some(profit),
            roi: Some(BENCHMARK_PROFIT_RATIO * 100.0),
            action: None,
        }),
        _ => recommendations.push(DemandRecommendation {
            kind: "stock_recommendation".to_string(),
            title: "Start with conservative stock levels".to_string(),
            description: "Record sales consistently so future predictions reflect your business".to_string(),
            priority: Some(Priority::Medium),
            total_investment: None,
            expected_profit: None,
            roi: None,
            action: Some("Track every sale for at least 30 days".to_string()),
        }),
    }

    let payload = DemandPayload {
        predictions,
        recommendations,
        expected_profit,
        timestamp: timestamp(request),
    };
    let confidence = payload.mean_confidence();

    let mut result = degraded(request, true, InsightPayload::Demand(payload));
    result.confidence = confidence;
    result
}

fn payment_fallback(request: &InsightRequest) -> InsightResult {
    let recommendation = PaymentRecommendation {
        customer_id: serde_json::Value::Null,
        customer_name: "Typical customer".to_string(),
        recommended_payment: 0.0,
        recommended_frequency: "weekly".to_string(),
        risk_level: RiskLevel::Medium,
        risk_score: 2.0,
        payment_history_score: None,
        avg_payment_days: Some(30.0),
        priority: Priority::Medium,
        note: Some("Standard terms: weekly follow-up, net 30 days".to_string()),
    };

    let risk_assessment = RiskAssessment {
        overall_risk_level: RiskLevel::Low,
        total_customers: 1,
        high_risk_count: 0,
        medium_risk_count: 0,
        low_risk_count: 1,
        risk_percentage: 0.0,
        recommendations: vec![
            "Implement a standard credit evaluation process".to_string(),
            "Set up payment reminders".to_string(),
            "Monitor customer payment patterns as history builds up".to_string(),
        ],
    };

    let mut result = degraded(
        request,
        true,
        InsightPayload::Payment(PaymentPayload {
            recommendations: vec![recommendation],
            risk_assessment,
            timestamp: timestamp(request),
        }),
    );
    result.risk_level = Some(RiskLevel::Medium);
    result
}

fn insight(kind: &str, title: &str, description: &str, priority: Priority, recs: &[&str]) -> BusinessInsight {
    BusinessInsight {
        kind: kind.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        recommendations: recs.iter().map(|r| r.to_string()).collect(),
        priority,
        impact_potential: None,
    }
}

fn insight_fallback(request: &InsightRequest) -> InsightResult {
    let insights = vec![
        insight(
            "profit_optimization",
            "Focus on profitable products",
            "Identify the items with the best margins and prioritise them",
            Priority::High,
            &["Review pricing on your top sellers", "Reduce stock of low-margin items"],
        ),
        insight(
            "expense_control",
            "Monitor expenses",
            "Keep recurring costs visible so they do not erode margins",
            Priority::Medium,
            &["Record every expense with a category", "Review expenses monthly"],
        ),
        insight(
            "customer_retention",
            "Retain existing customers",
            "Repeat customers are cheaper to serve than new ones",
            Priority::Medium,
            &["Follow up after each sale", "Reward repeat purchases"],
        ),
    ];

    let summary = BusinessSummary {
        overall_health: "starting".to_string(),
        health_score: 50.0,
        key_recommendations: vec![
            "Enter sales, purchases and expenses consistently".to_string(),
            "Revisit insights once a month of data is recorded".to_string(),
        ],
        summary: "Not enough data for a personalised analysis yet. Consistent data entry will unlock tailored insights."
            .to_string(),
    };

    degraded(
        request,
        true,
        InsightPayload::Insight(InsightsPayload {
            insights,
            summary,
            timestamp: timestamp(request),
        }),
    )
}

fn query_fallback(request: &InsightRequest) -> InsightResult {
    let mut result = degraded(
        request,
        false,
        InsightPayload::Query(QueryPayload {
            response: QUERY_APOLOGY.to_string(),
            confidence: 0.0,
            data_sources: Vec::new(),
            timestamp: timestamp(request),
        }),
    );
    result.confidence = Some(0.0);
    result.message = Some(QUERY_APOLOGY.to_string());
    result
}

fn train_fallback(request: &InsightRequest) -> InsightResult {
    let message = "Model training failed: the AI service could not be reached. Try again later.".to_string();
    let mut result = degraded(
        request,
        false,
        InsightPayload::Train(TrainPayload {
            status: "failed".to_string(),
            message: message.clone(),
            demand_model: Some(false),
            payment_model: Some(false),
            business_model: Some(false),
            timestamp: timestamp(request),
        }),
    );
    result.message = Some(message);
    result
}

fn status_fallback(request: &InsightRequest) -> InsightResult {
    let mut result = degraded(
        request,
        false,
        InsightPayload::Status(StatusPayload {
            demand_model: ModelStatus::untrained(),
            payment_model: ModelStatus::untrained(),
            business_model: ModelStatus::untrained(),
            timestamp: timestamp(request),
        }),
    );
    result.message = Some("Model status unknown: the AI service could not be reached.".to_string());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InsightParams;

    fn request(kind: OperationKind, params: InsightParams) -> InsightRequest {
        InsightRequest::new(kind, "biz-42", params).unwrap()
    }

    #[test]
    fn test_every_kind_has_a_policy() {
        for kind in OperationKind::ALL {
            let policy = FallbackPolicy::for_kind(kind);
            let result = policy.generate(&request(kind, InsightParams::default()));

            assert_eq!(policy.kind, kind);
            assert_eq!(result.kind(), kind);
            assert!(result.degraded);
            assert_eq!(result.note.as_deref(), Some(policy.note));
        }
    }

    #[test]
    fn test_demand_fallback_budget_profit() {
        let req = request(OperationKind::Demand, InsightParams::demand(Some(500_000.0), Some(30)));
        let result = FallbackPolicy::for_kind(OperationKind::Demand).generate(&req);

        assert!(result.success);
        match &result.payload {
            InsightPayload::Demand(payload) => {
                assert_eq!(payload.expected_profit, Some(150_000.0));
                assert_eq!(payload.predictions.len(), 2);
                assert!(payload
                    .predictions
                    .iter()
                    .all(|p| (0.4..=0.5).contains(&p.confidence)));
                assert!(payload.predictions[0].reason.contains("industry benchmark"));
                assert_eq!(payload.recommendations[0].expected_profit, Some(150_000.0));
                assert_eq!(payload.recommendations[0].total_investment, Some(500_000.0));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_demand_fallback_ignores_horizon() {
        let short = request(OperationKind::Demand, InsightParams::demand(None, Some(7)));
        let long = request(OperationKind::Demand, InsightParams::demand(None, Some(365)));
        let policy = FallbackPolicy::for_kind(OperationKind::Demand);

        match (policy.generate(&short).payload, policy.generate(&long).payload) {
            (InsightPayload::Demand(a), InsightPayload::Demand(b)) => {
                assert_eq!(a.predictions, b.predictions);
                assert_eq!(a.recommendations, b.recommendations);
            }
            other => panic!("unexpected payloads {:?}", other),
        }
    }

    #[test]
    fn test_demand_fallback_without_budget() {
        let req = request(OperationKind::Demand, InsightParams::default());
        let result = FallbackPolicy::for_kind(OperationKind::Demand).generate(&req);

        match result.payload {
            InsightPayload::Demand(payload) => {
                assert_eq!(payload.expected_profit, None);
                assert_eq!(payload.recommendations[0].kind, "stock_recommendation");
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_payment_fallback_defaults() {
        let result = FallbackPolicy::for_kind(OperationKind::Payment)
            .generate(&request(OperationKind::Payment, InsightParams::default()));

        assert!(result.success);
        assert_eq!(result.risk_level, Some(RiskLevel::Medium));
        match result.payload {
            InsightPayload::Payment(payload) => {
                assert_eq!(payload.recommendations.len(), 1);
                assert_eq!(payload.recommendations[0].recommended_frequency, "weekly");
                assert_eq!(payload.recommendations[0].risk_level, RiskLevel::Medium);
                assert_eq!(payload.risk_assessment.high_risk_count, 0);
                assert_eq!(payload.risk_assessment.low_risk_count, 1);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_insight_fallback_best_practices() {
        let result = FallbackPolicy::for_kind(OperationKind::Insight)
            .generate(&request(OperationKind::Insight, InsightParams::default()));

        assert!(result.success);
        match result.payload {
            InsightPayload::Insight(payload) => {
                let kinds: Vec<&str> = payload.insights.iter().map(|i| i.kind.as_str()).collect();
                assert_eq!(kinds, ["profit_optimization", "expense_control", "customer_retention"]);
                assert_eq!(payload.insights[0].priority, Priority::High);
                assert!(payload.summary.summary.contains("data entry"));
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_query_fallback_is_explicit_failure() {
        let req = request(OperationKind::Query, InsightParams::query("What is my margin?"));
        let result = FallbackPolicy::for_kind(OperationKind::Query).generate(&req);

        assert!(!result.success);
        assert_eq!(result.confidence, Some(0.0));
        match result.payload {
            InsightPayload::Query(payload) => assert_eq!(payload.confidence, 0.0),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_administrative_fallbacks_fail_with_explanation() {
        for kind in [OperationKind::Train, OperationKind::Status] {
            let result = FallbackPolicy::for_kind(kind).generate(&request(kind, InsightParams::default()));
            assert!(!result.success);
            let message = result.message.unwrap_or_default().to_lowercase();
            assert!(message.contains("failed") || message.contains("unknown"));
        }
    }

    #[test]
    fn test_generators_are_deterministic() {
        let req = request(OperationKind::Insight, InsightParams::default());
        let policy = FallbackPolicy::for_kind(OperationKind::Insight);
        assert_eq!(policy.generate(&req), policy.generate(&req));
    }
}
