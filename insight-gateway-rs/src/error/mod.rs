//! Error handling for the insight gateway
//!
//! Three separate taxonomies live here:
//! - `ServiceError`: anything that went wrong talking to the prediction
//!   service. These never reach the caller; the gateway turns them into a
//!   fallback result.
//! - `GatewayError`: caller misuse and construction problems. These are the
//!   only errors `InsightGateway::request_insight` returns.
//! - `AuditError`: audit sink failures, swallowed by the gateway.

use std::collections::HashMap;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub mod mapping;

/// Result type for upstream operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Failure talking to the upstream prediction service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Network or connection errors
    #[error("Network error: {0}")]
    Network(String),

    /// The call did not complete within the configured timeout
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Upstream rejected our credentials
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Upstream is throttling us
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Upstream returned a server-side or otherwise unexpected status
    #[error("Service error: {0}")]
    Service(String),

    /// Resource not found upstream
    #[error("Not found: {0}")]
    NotFound(String),

    /// Body could not be decoded into the expected schema
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// Body decoded but violated the schema's invariants
    #[error("Validation error: {0}")]
    Validation(String),

    /// Client could not be built from the given settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<ServiceError>,
        context: ErrorContext,
    },
}

impl ServiceError {
    pub fn network(message: impl Into<String>) -> Self {
        ServiceError::Network(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        ServiceError::Timeout(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ServiceError::Authentication(message.into())
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        ServiceError::RateLimit(message.into())
    }

    pub fn service(message: impl Into<String>) -> Self {
        ServiceError::Service(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn parsing(message: impl Into<String>) -> Self {
        ServiceError::Parsing(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        ServiceError::Configuration(message.into())
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        ServiceError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::WithContext { context, .. } => context.status_code,
            _ => None,
        }
    }

    /// Short, stable label used for logs and metrics
    pub fn category(&self) -> &'static str {
        match self {
            ServiceError::Network(_) => "network",
            ServiceError::Timeout(_) => "timeout",
            ServiceError::Authentication(_) => "authentication",
            ServiceError::RateLimit(_) => "rate_limit",
            ServiceError::Service(_) => "service",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Parsing(_) => "parsing",
            ServiceError::Validation(_) => "validation",
            ServiceError::Configuration(_) => "configuration",
            ServiceError::WithContext { inner, .. } => inner.category(),
        }
    }

    /// True when the failure came from the payload rather than the transport
    pub fn is_malformed_payload(&self) -> bool {
        matches!(self.category(), "parsing" | "validation")
    }
}

/// Error context information
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Service that generated the error
    pub service: String,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Endpoint that was called
    pub endpoint: Option<String>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            service: "prediction-service".to_string(),
            status_code: None,
            endpoint: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }
}

/// Convert reqwest errors to ServiceError
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        let context = ErrorContext::new();

        let service_error = if err.is_timeout() {
            ServiceError::timeout(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ServiceError::network(format!("Connection error: {}", err))
        } else if err.is_decode() {
            ServiceError::parsing(format!("Response decode error: {}", err))
        } else if err.is_redirect() {
            ServiceError::network(format!("Too many redirects: {}", err))
        } else {
            ServiceError::network(format!("HTTP client error: {}", err))
        };

        match err.status() {
            Some(status) => service_error.with_context(context.status_code(status.as_u16())),
            None => service_error.with_context(context),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::parsing(format!("JSON error: {}", err))
    }
}

/// Caller misuse, surfaced immediately and never replaced by a fallback
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("business id is required")]
    MissingBusinessId,

    #[error("unknown operation kind: {0}")]
    UnknownOperation(String),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MissingBusinessId => "MISSING_BUSINESS_ID",
            GatewayError::UnknownOperation(_) => "UNKNOWN_OPERATION",
            GatewayError::InvalidParams(_) => "INVALID_PARAMS",
            GatewayError::Configuration(_) => "CONFIGURATION",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ServiceError> for GatewayError {
    fn from(err: ServiceError) -> Self {
        GatewayError::Configuration(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        };
        (self.http_status(), Json(body)).into_response()
    }
}

/// Audit sink failure. Logged, never propagated past the gateway.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("audit io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("audit sink rejected record: {0}")]
    Rejected(String),
}
