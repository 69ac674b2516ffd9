//! reqwest-backed client for the prediction service

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::{route, PredictionService};
use crate::config::GatewayConfig;
use crate::error::{mapping, ErrorContext, Result, ServiceError};
use crate::models::{
    DemandPayload, InsightPayload, InsightRequest, InsightsPayload, OperationKind, PaymentPayload,
    QueryPayload, StatusPayload, TrainPayload, Validate,
};

const SERVICE_NAME: &str = "prediction-service";
const API_KEY_HEADER: &str = "X-API-KEY";

/// Request body shared by every POST endpoint
#[derive(Debug, Serialize)]
struct UpstreamBody<'a> {
    business_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    days_ahead: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
}

impl<'a> UpstreamBody<'a> {
    fn for_request(request: &'a InsightRequest) -> Self {
        let mut body = Self {
            business_id: &request.business_id,
            budget: None,
            days_ahead: None,
            query: None,
        };
        match request.kind {
            OperationKind::Demand => {
                body.budget = request.params.budget;
                body.days_ahead = Some(request.days_ahead());
            }
            // An empty query is forwarded as-is; the service decides what it means.
            OperationKind::Query => {
                body.query = Some(request.params.query.as_deref().unwrap_or(""));
            }
            _ => {}
        }
        body
    }
}

/// Build the underlying HTTP client with default headers
fn build_http_client(config: &GatewayConfig) -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&config.user_agent)
            .map_err(|e| ServiceError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    if let Some(ref key) = config.api_key {
        let mut value = header::HeaderValue::from_str(key)
            .map_err(|e| ServiceError::configuration(format!("Invalid API key header: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);
    }

    // the request deadline is enforced by the gateway around each call
    reqwest::Client::builder()
        .default_headers(headers)
        .gzip(true)
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success response into a ServiceError
async fn parse_error_response(endpoint: &str, response: Response) -> ServiceError {
    let status = response.status();
    let mut context = ErrorContext::for_service(SERVICE_NAME).endpoint(endpoint);

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    mapping::map_http_error(status, &body, &mut context).with_context(context)
}

fn decode<T>(body: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let payload: T = serde_json::from_str(body)?;
    payload.validate()?;
    Ok(payload)
}

/// Prediction service client over HTTP
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    http_client: Client,
    base_url: Url,
}

impl HttpPredictionClient {
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ServiceError::configuration(e.to_string()))?;

        let base_url = Url::parse(config.normalized_base_url()).map_err(|e| {
            ServiceError::configuration(format!("Invalid base url {}: {}", config.base_url, e))
        })?;

        Ok(Self {
            http_client: build_http_client(config)?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append percent-encoded path segments to the base url
    fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ServiceError::configuration(format!("Base url cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: &InsightRequest) -> Result<(String, String)> {
        let (method, segments) = route(request.kind, &request.business_id);
        let url = self.endpoint_url(&segments)?;
        let endpoint = url.path().to_string();

        let builder = if method == Method::GET {
            self.http_client.get(url)
        } else {
            self.http_client
                .request(method, url)
                .json(&UpstreamBody::for_request(request))
        };

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            ServiceError::from(e).with_context(ErrorContext::for_service(SERVICE_NAME).endpoint(&endpoint))
        })?;

        let status = response.status();
        debug!(
            endpoint = %endpoint,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prediction service responded"
        );

        if !status.is_success() {
            return Err(parse_error_response(&endpoint, response).await);
        }

        let body = response.text().await?;
        Ok((endpoint, body))
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn call(&self, request: &InsightRequest) -> Result<InsightPayload> {
        let (endpoint, body) = self.send(request).await?;

        let payload = match request.kind {
            OperationKind::Demand => decode::<DemandPayload>(&body).map(InsightPayload::Demand),
            OperationKind::Payment => decode::<PaymentPayload>(&body).map(InsightPayload::Payment),
            OperationKind::Insight => decode::<InsightsPayload>(&body).map(InsightPayload::Insight),
            OperationKind::Query => decode::<QueryPayload>(&body).map(InsightPayload::Query),
            OperationKind::Train => decode::<TrainPayload>(&body).map(InsightPayload::Train),
            OperationKind::Status => decode::<StatusPayload>(&body).map(InsightPayload::Status),
        };

        payload.map_err(|e| {
            warn!(endpoint = %endpoint, error = %e, "prediction service returned a malformed payload");
            e.with_context(ErrorContext::for_service(SERVICE_NAME).endpoint(endpoint))
        })
    }

    async fn health(&self) -> Result<bool> {
        let url = self.endpoint_url(&["health"])?;
        let response = self.http_client.get(url).send().await?;
        Ok(response.status().is_success())
    }
}
