//! # Structured Logging
//!
//! Installs the global `tracing` subscriber for the gateway binary.
//! `RUST_LOG` takes precedence over the configured level.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::ServerConfig;
use crate::error::GatewayError;

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Configuration for the logging system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub service_name: String,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            service_name: "insight-gateway".to_string(),
            json_format: false,
        }
    }
}

impl From<&ServerConfig> for LoggingConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            level: config.log_level.clone(),
            json_format: config.json_logs,
            ..Self::default()
        }
    }
}

/// Initialize logging once; later calls are no-ops
pub fn init_logging(config: LoggingConfig) -> Result<(), GatewayError> {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=warn,reqwest=warn", config.level)));

    let registry = Registry::default().with(filter);

    let installed = if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_target(true),
            )
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    if let Err(e) = installed {
        LOGGING_INITIALIZED.store(false, Ordering::SeqCst);
        return Err(GatewayError::Configuration(format!(
            "Failed to set global subscriber: {}",
            e
        )));
    }

    tracing::info!(
        service = %config.service_name,
        level = %config.level,
        json = config.json_format,
        "Structured logging initialized"
    );

    Ok(())
}
