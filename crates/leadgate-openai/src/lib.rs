// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI Chat Completions runtime adapter.
//!
//! Implements [`AgentRuntime`] on top of the streaming Chat Completions API:
//! one `stream_turn` call is one model round. Text deltas are forwarded as
//! they arrive; tool-call fragments are assembled across chunks and emitted
//! as complete [`TurnEvent::ToolCall`] events before `Done`.

pub mod client;
pub mod sse;
pub mod types;

use async_stream::try_stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};

use leadgate_config::model::OpenAiConfig;
use leadgate_core::{
    AdapterType, AgentRuntime, ChatRole, HealthStatus, LeadgateError, PluginAdapter,
    ToolCallRequest, TurnEvent, TurnRequest, TurnStream,
};

use crate::client::OpenAiClient;
use crate::sse::StreamEvent;
use crate::types::{ChatCompletionRequest, WireMessage};

pub use client::OpenAiClient as Client;

/// Chat Completions implementation of the agent runtime.
pub struct OpenAiRuntime {
    client: OpenAiClient,
    max_tokens: u32,
}

impl OpenAiRuntime {
    /// Build the runtime from config. Fails when no API key is configured.
    pub fn new(config: &OpenAiConfig) -> Result<Self, LeadgateError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| LeadgateError::Config("openai.api_key is not set".to_string()))?;
        let client =
            OpenAiClient::new(api_key, config.model.clone(), config.base_url.clone())?;
        Ok(Self {
            client,
            max_tokens: config.max_tokens,
        })
    }

    fn wire_messages(request: &TurnRequest) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system_prompt.is_empty() {
            messages.push(WireMessage::system(request.system_prompt.clone()));
        }
        for turn in &request.messages {
            let role = match turn.role {
                ChatRole::System => "system",
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
                ChatRole::Tool => "tool",
            };
            // An assistant turn that only requested tools carries no content.
            let content = if turn.content.is_empty() && turn.tool_calls.is_some() {
                None
            } else {
                Some(turn.content.clone())
            };
            messages.push(WireMessage {
                role: role.to_string(),
                content,
                tool_call_id: turn.tool_call_id.clone(),
                tool_calls: turn.tool_calls.clone(),
            });
        }
        messages
    }
}

#[async_trait]
impl PluginAdapter for OpenAiRuntime {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Runtime
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadgateError> {
        // No probe request; a misconfigured key surfaces on the first turn.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AgentRuntime for OpenAiRuntime {
    async fn stream_turn(&self, request: TurnRequest) -> Result<TurnStream, LeadgateError> {
        let wire_request = ChatCompletionRequest {
            model: self.client.default_model().to_string(),
            messages: Self::wire_messages(&request),
            max_tokens: self.max_tokens,
            stream: true,
            tools: if request.tools.is_empty() {
                None
            } else {
                Some(request.tools.clone())
            },
        };

        let chunks = self.client.stream_completion(&wire_request).await?;
        Ok(adapt_stream(chunks))
    }
}

/// Partially assembled tool call, keyed by the provider's fragment index.
#[derive(Debug, Default)]
struct PartialCall {
    id: String,
    name: String,
    arguments: String,
}

/// Adapt the chunk stream into turn events, assembling tool-call fragments.
fn adapt_stream<S>(mut chunks: S) -> TurnStream
where
    S: Stream<Item = Result<StreamEvent, LeadgateError>> + Send + Unpin + 'static,
{
    Box::pin(try_stream! {
        let mut pending: Vec<(usize, PartialCall)> = Vec::new();

        while let Some(event) = chunks.next().await {
            match event? {
                StreamEvent::Chunk(chunk) => {
                    for choice in chunk.choices {
                        if let Some(content) = choice.delta.content {
                            if !content.is_empty() {
                                yield TurnEvent::TextDelta(content);
                            }
                        }
                        if let Some(fragments) = choice.delta.tool_calls {
                            for frag in fragments {
                                let pos = match pending
                                    .iter()
                                    .position(|(idx, _)| *idx == frag.index)
                                {
                                    Some(pos) => pos,
                                    None => {
                                        pending.push((frag.index, PartialCall::default()));
                                        pending.len() - 1
                                    }
                                };
                                let slot = &mut pending[pos].1;
                                if let Some(id) = frag.id {
                                    slot.id = id;
                                }
                                if let Some(function) = frag.function {
                                    if let Some(name) = function.name {
                                        slot.name = name;
                                    }
                                    if let Some(arguments) = function.arguments {
                                        slot.arguments.push_str(&arguments);
                                    }
                                }
                            }
                        }
                    }
                }
                StreamEvent::Done => break,
            }
        }

        for (_, call) in pending {
            let arguments = if call.arguments.trim().is_empty() {
                serde_json::json!({})
            } else {
                serde_json::from_str(&call.arguments).map_err(|e| LeadgateError::Runtime {
                    message: format!("malformed tool call arguments: {e}"),
                    source: Some(Box::new(e)),
                })?
            };
            yield TurnEvent::ToolCall(ToolCallRequest {
                id: call.id,
                name: call.name,
                arguments,
            });
        }

        yield TurnEvent::Done;
    })
}
