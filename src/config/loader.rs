use std::path::Path;

use anyhow::{anyhow, Context, Result};
use regex::Regex;
use tracing::debug;

use crate::config::settings::{SettingsConfig, SettingsOverrides};

/// Resolve the effective settings: optional YAML file, then command line /
/// environment overrides, then validation.
pub async fn load(config_path: Option<&str>, overrides: SettingsOverrides) -> Result<SettingsConfig> {
    let mut settings = match config_path {
        Some(path) => file_to_settings(Path::new(path))
            .await
            .with_context(|| format!("Invalid config '{}'", path))?,
        None => SettingsConfig::default(),
    };
    overrides.apply(&mut settings);

    // logging is not initialised yet, every problem goes into the error itself
    validate_settings(&settings)
        .map_err(|errors| anyhow!("invalid settings: {}", errors.join("; ")))?;
    Ok(settings)
}

/// Load settings from a YAML file, expanding `${VAR}` / `${VAR:default}`
pub async fn file_to_settings(path: &Path) -> Result<SettingsConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    let expanded = expand_env_vars(&content)?;
    parse_settings(&expanded)
}

pub fn parse_settings(content: &str) -> Result<SettingsConfig> {
    if content.trim().is_empty() {
        debug!("empty config, using defaults");
        return Ok(SettingsConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| anyhow!("parse config error: {}", e))
}

/// Aggregates every problem instead of stopping at the first one.
pub fn validate_settings(settings: &SettingsConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let cdek = &settings.cdek;
    if cdek.oauth_url.trim().is_empty() {
        errors.push("cdek.oauth_url is empty".to_string());
    }
    if cdek.api_base.trim().is_empty() {
        errors.push("cdek.api_base is empty".to_string());
    }
    if cdek.safety_window_seconds == 0 {
        errors.push("cdek.safety_window_seconds must be > 0".to_string());
    }
    if cdek.timeout_ms == 0 {
        errors.push("cdek.timeout_ms must be > 0".to_string());
    }
    if settings.metrics.is_enabled && !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }
    if settings.cors.origin.is_empty() {
        errors.push("cors.origin is empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn expand_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{(\w+)(?::([^\}]+))?\}")?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var = &caps[1];
            let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var).unwrap_or_else(|_| default.to_string())
        })
        .to_string())
}
