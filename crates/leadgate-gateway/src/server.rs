// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;

use leadgate_agent::{Tool, ToolRegistry};
use leadgate_config::model::VoiceConfig;
use leadgate_core::{AgentRuntime, LeadStore, LeadgateError, NamePolicy};

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Lead persistence.
    pub store: Arc<dyn LeadStore>,
    /// Conversational model runtime.
    pub runtime: Arc<dyn AgentRuntime>,
    /// Tools available to chat turns.
    pub tools: Arc<ToolRegistry>,
    /// The voice-channel capture tool invoked by the tool webhook.
    pub voice_tool: Arc<dyn Tool>,
    /// System prompt for chat turns.
    pub system_prompt: Arc<str>,
    /// Name merge policy for direct resolver calls (contact form).
    pub policy: NamePolicy,
    /// Voice provider settings for token minting.
    pub voice: VoiceConfig,
    /// Authentication configuration for admin routes.
    pub auth: AuthConfig,
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
}

/// Gateway server configuration (mirrors GatewayConfig from leadgate-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router. Split from [`start_server`] so tests can drive
/// it without binding a socket.
pub fn build_router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    // Public capture surface: the marketing site and the voice runtime talk
    // to these without credentials.
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/chat", post(handlers::post_chat))
        .route("/v1/contact", post(handlers::post_contact))
        .route("/v1/voice/tool", post(handlers::post_voice_tool))
        .route("/v1/voice/token", get(handlers::get_voice_token))
        .route("/v1/track", post(handlers::post_track))
        .with_state(state.clone());

    // Admin surface behind bearer auth.
    let admin_routes = Router::new()
        .route("/v1/leads", get(handlers::get_leads))
        .route("/v1/leads/{id}/messages", get(handlers::get_lead_messages))
        .route("/v1/leads/{id}/status", patch(handlers::patch_lead_status))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), LeadgateError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| LeadgateError::Channel {
                message: format!("failed to bind gateway to {addr}: {e}"),
                source: Some(Box::new(e)),
            })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| LeadgateError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
