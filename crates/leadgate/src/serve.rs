// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadgate serve` command implementation.
//!
//! Wires SQLite storage, the OpenAI runtime, the capture tools, and the
//! HTTP gateway together, then runs until a shutdown signal arrives.

use std::sync::Arc;

use tracing::info;

use leadgate_agent::{SaveLeadTool, ToolRegistry};
use leadgate_config::model::LeadgateConfig;
use leadgate_core::{LeadStore, LeadgateError, SourceChannel};
use leadgate_gateway::{AuthConfig, GatewayState, ServerConfig, start_server};
use leadgate_openai::OpenAiRuntime;
use leadgate_storage::SqliteStore;

/// Runs the `leadgate serve` command.
pub async fn run_serve(config: LeadgateConfig) -> Result<(), LeadgateError> {
    init_tracing(&config.site.log_level);

    info!(site = %config.site.name, "starting leadgate serve");

    let store = Arc::new(SqliteStore::new(config.storage.clone()));
    store.initialize().await?;

    let runtime = Arc::new(OpenAiRuntime::new(&config.openai)?);

    let policy = config.resolver.name_policy;
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(SaveLeadTool::new(
        store.clone(),
        policy,
        SourceChannel::Chat,
    )));
    let voice_tool = Arc::new(SaveLeadTool::new(
        store.clone(),
        policy,
        SourceChannel::Voice,
    ));

    let system_prompt = resolve_system_prompt(&config)?;

    let state = GatewayState {
        store: store.clone(),
        runtime,
        tools: Arc::new(tools),
        voice_tool,
        system_prompt: Arc::from(system_prompt.as_str()),
        policy,
        voice: config.voice.clone(),
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        start_time: std::time::Instant::now(),
    };

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };

    tokio::select! {
        result = start_server(&server_config, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    store.close().await?;
    info!("leadgate serve shutdown complete");
    Ok(())
}

/// Resolve the chat system prompt: a prompt file takes precedence over the
/// inline string, which takes precedence over the built-in default.
fn resolve_system_prompt(config: &LeadgateConfig) -> Result<String, LeadgateError> {
    if let Some(path) = config.site.system_prompt_file.as_deref() {
        return std::fs::read_to_string(path).map_err(|e| {
            LeadgateError::Config(format!("failed to read site.system_prompt_file {path}: {e}"))
        });
    }
    if let Some(prompt) = config.site.system_prompt.as_deref() {
        return Ok(prompt.to_string());
    }
    Ok(default_system_prompt(&config.site.name))
}

fn default_system_prompt(site_name: &str) -> String {
    format!(
        "You are the assistant for {site_name}, a marketing website. Answer \
         questions about the site briefly and helpfully. Whenever the visitor \
         mentions their name, email, phone number, or the problem they need \
         help with, call the save_lead_info tool with the details you have so \
         far; repeated calls update the same record. Never invent contact \
         details the visitor did not state."
    )
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("leadgate={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
