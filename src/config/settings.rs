use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_CDEK_API_BASE, DEFAULT_CDEK_OAUTH_URL, DEFAULT_CORS_ORIGIN, DEFAULT_HOST,
    DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_METRICS_PATH, DEFAULT_PORT, DEFAULT_SAFETY_WINDOW_SECS,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub cdek: CdekConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: Option<LoggingConfig>,
}

/// Command line / environment values, applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub port: Option<u16>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub cors_origin: Option<String>,
}

impl SettingsOverrides {
    pub fn apply(self, settings: &mut SettingsConfig) {
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if self.client_id.is_some() {
            settings.cdek.client_id = self.client_id;
        }
        if self.client_secret.is_some() {
            settings.cdek.client_secret = self.client_secret;
        }
        if let Some(origin) = self.cors_origin {
            settings.cors.origin = origin;
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// value of `Access-Control-Allow-Origin`
    #[serde(default = "default_cors_origin")]
    pub origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: default_cors_origin(),
        }
    }
}

/// ================================
/// Carrier API
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct CdekConfig {
    #[serde(default = "default_oauth_url")]
    pub oauth_url: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// not validated: missing credentials fail at the first token exchange
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// how long a fetched token is served, must stay below the issued lifetime
    #[serde(default = "default_safety_window_seconds")]
    pub safety_window_seconds: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CdekConfig {
    fn default() -> Self {
        Self {
            oauth_url: default_oauth_url(),
            api_base: default_api_base(),
            client_id: None,
            client_secret: None,
            safety_window_seconds: default_safety_window_seconds(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl CdekConfig {
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.client_id) && present(&self.client_secret)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_cors_origin() -> String {
    DEFAULT_CORS_ORIGIN.to_string()
}

fn default_oauth_url() -> String {
    DEFAULT_CDEK_OAUTH_URL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_CDEK_API_BASE.to_string()
}

fn default_safety_window_seconds() -> u64 {
    DEFAULT_SAFETY_WINDOW_SECS
}

fn default_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_string()
}
