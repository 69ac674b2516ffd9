use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use insight_gateway::audit::{AuditSink, JsonlAuditSink, TracingAuditSink};
use insight_gateway::config::{EnvConfigProvider, GatewayConfig, ServerConfig};
use insight_gateway::logging::{init_logging, LoggingConfig};
use insight_gateway::server::{router, AppState};
use insight_gateway::InsightGateway;

const ENV_PREFIX: &str = "INSIGHT";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let provider = EnvConfigProvider::new().with_prefix(ENV_PREFIX);
    let server_config = ServerConfig::from_provider(&provider).context("invalid server configuration")?;
    init_logging(LoggingConfig::from(&server_config)).context("failed to initialize logging")?;

    let gateway_config = GatewayConfig::from_provider(&provider).context("invalid gateway configuration")?;
    info!(
        base_url = %gateway_config.base_url,
        request_timeout_ms = gateway_config.request_timeout.as_millis() as u64,
        api_key = gateway_config.api_key.is_some(),
        "Prediction service configured"
    );

    let audit: Arc<dyn AuditSink> = match server_config.audit_log_path {
        Some(ref path) => {
            let sink = JsonlAuditSink::open(path)
                .await
                .with_context(|| format!("cannot open audit log {}", path.display()))?;
            info!(path = %path.display(), "Writing audit records to file");
            Arc::new(sink)
        }
        None => Arc::new(TracingAuditSink),
    };

    let gateway = InsightGateway::from_config(gateway_config)
        .context("failed to build gateway")?
        .with_audit_sink(audit);

    if !gateway.upstream_healthy().await {
        warn!("Prediction service is not reachable; requests will be served from fallbacks");
    }

    let app = router(Arc::new(AppState::new(gateway)));
    let listener = tokio::net::TcpListener::bind(server_config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", server_config.bind_addr))?;

    info!(addr = %server_config.bind_addr, "Insight gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}
