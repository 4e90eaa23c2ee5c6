//! Shared constants and invariants

pub const SERVICE_NAME: &str = "cdek-proxy";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CORS_ORIGIN: &str = "*";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

pub const DEFAULT_CDEK_OAUTH_URL: &str = "https://api.cdek.ru/v2/oauth/token";
pub const DEFAULT_CDEK_API_BASE: &str = "https://api.cdek.ru/v2";

/// 50 minutes; CDEK issues tokens for 60
pub const DEFAULT_SAFETY_WINDOW_SECS: u64 = 50 * 60;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;

// CORS headers attached to every response
pub const CORS_ALLOW_METHODS: &str = "GET,POST,OPTIONS";
pub const CORS_ALLOW_HEADERS: &str = "Content-Type";

pub const MISSING_PARAMS_MSG: &str = "missing required parameters";
