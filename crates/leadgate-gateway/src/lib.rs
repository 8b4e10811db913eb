// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Leadgate server.
//!
//! Public capture surface (chat, contact form, voice webhook, visit
//! tracking) plus bearer-protected admin routes for working the lead list.

pub mod auth;
pub mod handlers;
pub mod server;
mod sse;

pub use auth::AuthConfig;
pub use server::{GatewayState, ServerConfig, build_router, start_server};
