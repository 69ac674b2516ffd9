//! Configuration management for the insight gateway
//!
//! Settings are read through a `ConfigProvider` so the same loading code
//! works against environment variables in the binary and against an
//! in-memory map in tests. The gateway itself only ever receives the
//! resulting `GatewayConfig` struct.

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::util::parse_duration;

type ConfigResult<T> = std::result::Result<T, GatewayError>;

pub const DEFAULT_AI_SERVICE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_AUDIT_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8282";

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> ConfigResult<String>;
}

/// Typed accessors on top of `ConfigProvider`
pub trait ConfigProviderExt: ConfigProvider {
    fn get_bool(&self, key: &str) -> ConfigResult<bool> {
        let value = self.get_string(key)?;
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(GatewayError::Configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get a duration; a missing key yields `default`, a malformed one an error
    fn get_duration_or(&self, key: &str, default: Duration) -> ConfigResult<Duration> {
        match self.get_string(key) {
            Ok(raw) => parse_duration(&raw).ok_or_else(|| {
                GatewayError::Configuration(format!("Invalid duration for key {}: {}", key, raw))
            }),
            Err(_) => Ok(default),
        }
    }

    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Missing and empty values both read as `None`
    fn get_optional(&self, key: &str) -> Option<String> {
        self.get_string(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Format a configuration key as an environment variable
    fn format_key(&self, key: &str) -> String {
        let key = key
            .to_uppercase()
            .replace(|c: char| !c.is_ascii_alphanumeric(), "_");

        match self.prefix {
            Some(ref prefix) => format!("{}_{}", prefix, key),
            None => key,
        }
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> ConfigResult<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                GatewayError::Configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => GatewayError::Configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> ConfigResult<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| GatewayError::Configuration(format!("Configuration key not found: {}", key)))
    }
}

/// Settings for the outbound side of the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Prediction service base address, e.g. `http://ai-service:8000`
    pub base_url: String,

    /// Upper bound for one upstream call, including reading the body
    pub request_timeout: Duration,

    /// Upper bound for one audit append
    pub audit_timeout: Duration,

    /// Sent as `X-API-KEY` when present
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AI_SERVICE_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            audit_timeout: DEFAULT_AUDIT_TIMEOUT,
            api_key: None,
            user_agent: format!("insight-gateway/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GatewayConfig {
    /// Config pointing at `base_url` with every other setting defaulted
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_audit_timeout(mut self, timeout: Duration) -> Self {
        self.audit_timeout = timeout;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> ConfigResult<Self> {
        let defaults = Self::default();

        let config = Self {
            base_url: provider.get_string_or("ai_service_url", DEFAULT_AI_SERVICE_URL),
            request_timeout: provider.get_duration_or("ai_request_timeout", DEFAULT_REQUEST_TIMEOUT)?,
            audit_timeout: provider.get_duration_or("ai_audit_timeout", DEFAULT_AUDIT_TIMEOUT)?,
            api_key: provider.get_optional("ai_api_key"),
            user_agent: provider.get_string_or("ai_user_agent", &defaults.user_agent),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let url = url::Url::parse(&self.base_url).map_err(|e| {
            GatewayError::Configuration(format!("Invalid prediction service url {}: {}", self.base_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(GatewayError::Configuration(format!(
                "Prediction service url must be http(s): {}",
                self.base_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(GatewayError::Configuration("Request timeout must be non-zero".to_string()));
        }

        if self.audit_timeout.is_zero() {
            return Err(GatewayError::Configuration("Audit timeout must be non-zero".to_string()));
        }

        Ok(())
    }

    /// Base url without a trailing slash, ready for path concatenation
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Settings for the HTTP controller binary
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    /// Append-only JSON-lines audit file; audit goes to the log when unset
    pub audit_log_path: Option<PathBuf>,

    pub log_level: String,

    pub json_logs: bool,
}

impl ServerConfig {
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> ConfigResult<Self> {
        let raw_addr = provider.get_string_or("bind_addr", DEFAULT_BIND_ADDR);
        let bind_addr = raw_addr
            .trim_start_matches("http://")
            .parse::<SocketAddr>()
            .map_err(|e| GatewayError::Configuration(format!("Invalid bind address {}: {}", raw_addr, e)))?;

        Ok(Self {
            bind_addr,
            audit_log_path: provider.get_optional("audit_log").map(PathBuf::from),
            log_level: provider.get_string_or("log_level", "info"),
            json_logs: provider.get_bool_or("log_json", false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_format() {
        let provider = EnvConfigProvider::new().with_prefix("INSIGHT");
        assert_eq!(provider.format_key("ai_service_url"), "INSIGHT_AI_SERVICE_URL");
        assert_eq!(provider.format_key("bind-addr"), "INSIGHT_BIND_ADDR");
        assert_eq!(EnvConfigProvider::new().format_key("log_json"), "LOG_JSON");
    }

    #[test]
    fn test_memory_provider_typed_getters() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("flag", "yes");
        provider.set("wait", "250ms");
        provider.set("blank", "  ");

        assert!(provider.get_bool("flag").unwrap());
        assert_eq!(
            provider.get_duration_or("wait", Duration::from_secs(1)).unwrap(),
            Duration::from_millis(250)
        );
        assert_eq!(
            provider.get_duration_or("missing", Duration::from_secs(1)).unwrap(),
            Duration::from_secs(1)
        );
        assert_eq!(provider.get_optional("blank"), None);
        assert!(provider.get_string("absent").is_err());
    }
}
