// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as valid bind addresses, non-empty paths, and coherent
//! voice settings.

use crate::diagnostic::ConfigError;
use crate::model::LeadgateConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &LeadgateConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate log level is one of the known tracing levels.
    if !LOG_LEVELS.contains(&config.site.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "site.log_level `{}` is not one of: {}",
                config.site.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    // Validate database_path is not empty.
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    // Validate gateway host looks like a valid IP or hostname.
    let host = config.gateway.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::Validation {
            message: "gateway.host must not be empty".to_string(),
        });
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!("gateway.host `{host}` is not a valid IP address or hostname"),
            });
        }
    }

    // Validate max_tokens is sane.
    if config.openai.max_tokens == 0 {
        errors.push(ConfigError::Validation {
            message: "openai.max_tokens must be greater than zero".to_string(),
        });
    }

    // A voice section that is enabled needs something to hand to clients.
    if config.voice.enabled && config.voice.url.is_none() && config.voice.static_token.is_none() {
        errors.push(ConfigError::Validation {
            message: "voice.enabled requires voice.url or voice.static_token".to_string(),
        });
    }

    // An empty bearer token is almost certainly a mistake; require it to be
    // either absent or non-empty.
    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "gateway.bearer_token must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
