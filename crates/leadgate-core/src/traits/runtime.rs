// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent runtime trait for conversational AI backends.

use async_trait::async_trait;

use crate::error::LeadgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{TurnRequest, TurnStream};

/// Adapter for the external conversational-AI service.
///
/// One `stream_turn` call covers a single model round: the runtime streams
/// text deltas and may request tool invocations. Executing tools and feeding
/// results back for a follow-up round is the turn loop's job, not the
/// runtime's — the runtime has no knowledge of how tools are dispatched.
#[async_trait]
pub trait AgentRuntime: PluginAdapter {
    /// Streams one model round for the given transcript and tool definitions.
    async fn stream_turn(&self, request: TurnRequest) -> Result<TurnStream, LeadgateError>;
}
