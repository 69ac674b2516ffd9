//! Tests for the error taxonomy and its HTTP mapping

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use reqwest::StatusCode as HttpStatus;
    use serde_json::Value;

    use crate::error::mapping::map_http_error;
    use crate::error::{ErrorContext, GatewayError, ServiceError};

    #[test]
    fn test_category_survives_context() {
        let err = ServiceError::timeout("slow").with_context(
            ErrorContext::for_service("prediction-service")
                .endpoint("/predict/demand")
                .status_code(504),
        );

        assert_eq!(err.category(), "timeout");
        assert_eq!(err.status_code(), Some(504));
        assert_eq!(err.to_string(), "Timeout error: slow");
    }

    #[test]
    fn test_malformed_payload_detection() {
        assert!(ServiceError::parsing("bad json").is_malformed_payload());
        assert!(ServiceError::validation("empty list")
            .with_context(ErrorContext::new())
            .is_malformed_payload());
        assert!(!ServiceError::network("refused").is_malformed_payload());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (HttpStatus::UNAUTHORIZED, "authentication"),
            (HttpStatus::FORBIDDEN, "authentication"),
            (HttpStatus::TOO_MANY_REQUESTS, "rate_limit"),
            (HttpStatus::NOT_FOUND, "not_found"),
            (HttpStatus::GATEWAY_TIMEOUT, "timeout"),
            (HttpStatus::UNPROCESSABLE_ENTITY, "validation"),
            (HttpStatus::SERVICE_UNAVAILABLE, "service"),
        ];

        for (status, category) in cases {
            let mut context = ErrorContext::new();
            let err = map_http_error(status, "", &mut context);
            assert_eq!(err.category(), category, "status {}", status);
            assert_eq!(context.status_code, Some(status.as_u16()));
        }
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let mut context = ErrorContext::new();
        let err = map_http_error(HttpStatus::INTERNAL_SERVER_ERROR, &body, &mut context);
        assert!(err.to_string().len() < 200);
        assert!(err.to_string().ends_with("..."));
    }

    #[test]
    fn test_gateway_error_codes() {
        assert_eq!(GatewayError::MissingBusinessId.code(), "MISSING_BUSINESS_ID");
        assert_eq!(GatewayError::MissingBusinessId.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            GatewayError::UnknownOperation("x".into()).http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Configuration("x".into()).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_error_converts_to_configuration() {
        let err: GatewayError = ServiceError::configuration("bad header").into();
        assert!(matches!(err, GatewayError::Configuration(ref m) if m.contains("bad header")));
    }

    #[tokio::test]
    async fn test_gateway_error_response_body() {
        let response = GatewayError::InvalidParams("budget must be a non-negative number".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_PARAMS");
        assert!(body["error"].as_str().unwrap().contains("budget"));
    }
}
