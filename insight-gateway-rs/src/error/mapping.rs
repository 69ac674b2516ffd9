//! Error mapping for prediction service responses
//!
//! Converts non-success HTTP responses into `ServiceError` values. The
//! prediction service reports failures as `{"detail": ...}` where `detail`
//! is either a string or a list of validation entries.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ServiceError};

/// Pull a human-readable message out of an error body
fn extract_message(json: &Value) -> Option<String> {
    match json.get("detail") {
        Some(Value::String(detail)) => return Some(detail.clone()),
        Some(Value::Array(entries)) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(|m| m.as_str()))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }

    json.get("message")
        .or_else(|| json.get("error"))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

/// Map a prediction service error response to a ServiceError
pub fn map_http_error(status: StatusCode, body: &str, context: &mut ErrorContext) -> ServiceError {
    context.status_code = Some(status.as_u16());

    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| extract_message(&json))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else if body.len() > 100 {
                format!("{}: {}...", status, crate::util::truncate_string(body, 100))
            } else {
                format!("{}: {}", status, body)
            }
        });

    context.add("category", classify_http_error(status));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ServiceError::authentication(message),
        StatusCode::TOO_MANY_REQUESTS => ServiceError::rate_limit(message),
        StatusCode::NOT_FOUND => ServiceError::not_found(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ServiceError::timeout(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ServiceError::validation(message),
        _ => ServiceError::service(message),
    }
}

/// Helper function to classify HTTP errors by category
pub fn classify_http_error(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 | 422 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 | 504 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fastapi_string_detail() {
        let mut context = ErrorContext::new();
        let err = map_http_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail": "Demand prediction failed: no data"}"#,
            &mut context,
        );

        assert!(matches!(err, ServiceError::Service(ref m) if m == "Demand prediction failed: no data"));
        assert_eq!(context.status_code, Some(500));
        assert_eq!(context.data.get("category").map(String::as_str), Some("server"));
    }

    #[test]
    fn test_fastapi_validation_detail() {
        let mut context = ErrorContext::new();
        let body = r#"{"detail": [{"loc": ["body", "business_id"], "msg": "field required"}]}"#;
        let err = map_http_error(StatusCode::UNPROCESSABLE_ENTITY, body, &mut context);

        assert!(matches!(err, ServiceError::Validation(ref m) if m == "field required"));
    }

    #[test]
    fn test_plain_text_body() {
        let mut context = ErrorContext::new();
        let err = map_http_error(StatusCode::UNAUTHORIZED, "nope", &mut context);
        assert!(matches!(err, ServiceError::Authentication(_)));

        let err = map_http_error(StatusCode::BAD_GATEWAY, "", &mut context);
        assert!(matches!(err, ServiceError::Service(ref m) if m.contains("502")));
    }

    #[test]
    fn test_classify_http_error() {
        assert_eq!(classify_http_error(StatusCode::TOO_MANY_REQUESTS), "rate_limit");
        assert_eq!(classify_http_error(StatusCode::SERVICE_UNAVAILABLE), "server");
        assert_eq!(classify_http_error(StatusCode::IM_A_TEAPOT), "unknown");
    }
}
