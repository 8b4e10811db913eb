// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Leadgate server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use leadgate_core::NamePolicy;
use serde::{Deserialize, Serialize};

/// Top-level Leadgate configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LeadgateConfig {
    /// Site identity and assistant behavior settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// OpenAI chat runtime settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// External voice-session provider settings.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Lead identity resolver settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Site identity and assistant behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Display name used in logs and the default system prompt.
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a markdown file containing the system prompt.
    /// Takes precedence over `system_prompt` if both are set.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

fn default_site_name() -> String {
    "leadgate".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("leadgate").join("leadgate.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "leadgate.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token protecting the admin routes. `None` disables them.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8620
}

/// OpenAI chat runtime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// OpenAI API key. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier for chat turns.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Chat completions endpoint. Overridable for self-hosted gateways.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            base_url: default_base_url(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

/// External voice-session provider configuration.
///
/// Token signing and the voice agent itself are provider-owned; these values
/// only describe the room the gateway hands out to browser clients.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceConfig {
    /// Enable the voice token and tool-webhook endpoints.
    #[serde(default)]
    pub enabled: bool,

    /// Provider WebSocket URL handed to clients.
    #[serde(default)]
    pub url: Option<String>,

    /// Room name prefix for generated rooms.
    #[serde(default)]
    pub room_prefix: Option<String>,

    /// Pre-signed static token, when the provider issues one out of band.
    #[serde(default)]
    pub static_token: Option<String>,

    /// Shared secret the voice runtime presents on tool webhook calls.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

/// Lead identity resolver configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Name merge policy: `first-wins` (a confirmed name is never
    /// overwritten) or `last-wins` (later corrections apply).
    #[serde(default)]
    pub name_policy: NamePolicy,
}
