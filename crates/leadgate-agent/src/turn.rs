// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The agent turn loop.
//!
//! One call to [`run_turn`] drives a complete conversational turn: it streams
//! model output, forwards text deltas to an optional channel (for SSE), and
//! executes any requested tool calls before handing the results back to the
//! runtime for the next round. Tool rounds are bounded so a misbehaving model
//! cannot loop forever.

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use leadgate_core::{
    AgentRuntime, ChatRole, ChatTurn, LeadgateError, ToolCallRequest, TurnEvent, TurnRequest,
};

use crate::tool::ToolRegistry;

/// Maximum model rounds per turn (initial round plus tool follow-ups).
const MAX_ROUNDS: usize = 4;

/// Run one agent turn to completion.
///
/// `transcript` is the conversation so far, ending with the user's latest
/// message. Text deltas are forwarded to `deltas` as they arrive when a
/// sender is supplied; the full assistant reply is returned either way.
pub async fn run_turn(
    runtime: &dyn AgentRuntime,
    tools: &ToolRegistry,
    system_prompt: &str,
    mut transcript: Vec<ChatTurn>,
    deltas: Option<mpsc::Sender<String>>,
) -> Result<String, LeadgateError> {
    let tool_definitions = tools.tool_definitions();
    let mut reply = String::new();

    for round in 0..MAX_ROUNDS {
        let request = TurnRequest {
            system_prompt: system_prompt.to_string(),
            messages: transcript.clone(),
            tools: tool_definitions.clone(),
        };

        let mut stream = runtime.stream_turn(request).await?;
        let mut round_text = String::new();
        let mut tool_calls: Vec<ToolCallRequest> = Vec::new();

        while let Some(event) = stream.next().await {
            match event? {
                TurnEvent::TextDelta(delta) => {
                    if let Some(tx) = &deltas {
                        // A dropped receiver just means the client went away;
                        // keep accumulating so the transcript stays complete.
                        let _ = tx.send(delta.clone()).await;
                    }
                    round_text.push_str(&delta);
                }
                TurnEvent::ToolCall(call) => tool_calls.push(call),
                TurnEvent::Done => break,
            }
        }

        reply.push_str(&round_text);

        if tool_calls.is_empty() {
            return Ok(reply);
        }

        debug!(round, count = tool_calls.len(), "executing tool calls");
        transcript.push(assistant_tool_turn(&round_text, &tool_calls));
        for call in tool_calls {
            let output = execute_tool(tools, &call).await?;
            transcript.push(ChatTurn {
                role: ChatRole::Tool,
                content: output,
                tool_call_id: Some(call.id),
                tool_calls: None,
            });
        }
    }

    warn!("turn hit the tool round limit");
    Ok(reply)
}

/// Build the assistant transcript entry echoing the requested tool calls in
/// the provider wire format.
fn assistant_tool_turn(text: &str, calls: &[ToolCallRequest]) -> ChatTurn {
    let wire_calls: Vec<serde_json::Value> = calls
        .iter()
        .map(|call| {
            serde_json::json!({
                "id": call.id,
                "type": "function",
                "function": {
                    "name": call.name,
                    "arguments": call.arguments.to_string(),
                },
            })
        })
        .collect();
    ChatTurn {
        role: ChatRole::Assistant,
        content: text.to_string(),
        tool_call_id: None,
        tool_calls: Some(serde_json::Value::Array(wire_calls)),
    }
}

/// Invoke one tool, mapping an unknown name to an in-band error result.
async fn execute_tool(
    tools: &ToolRegistry,
    call: &ToolCallRequest,
) -> Result<String, LeadgateError> {
    match tools.get(&call.name) {
        Some(tool) => {
            let output = tool.invoke(call.arguments.clone()).await?;
            if output.is_error {
                warn!(tool = %call.name, "tool reported an error result");
            }
            Ok(output.content)
        }
        None => {
            warn!(tool = %call.name, "model requested an unknown tool");
            Ok(format!("error: unknown tool `{}`", call.name))
        }
    }
}
