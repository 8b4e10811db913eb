// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-sent-events streaming for the chat endpoint.
//!
//! Event names: `text_delta` for incremental assistant text, `message_stop`
//! with the full reply once the turn is persisted, `error` when the turn
//! fails after the stream has started.

use std::convert::Infallible;

use axum::response::{
    IntoResponse, Response,
    sse::{Event, Sse},
};
use tokio::sync::mpsc;
use tracing::warn;

use leadgate_agent::run_turn;
use leadgate_core::{Direction, NewMessage};

use crate::handlers::{ChatRequest, error_response, prepare_turn};
use crate::server::GatewayState;

/// Run one chat turn and stream it as SSE.
///
/// Pre-turn failures (unknown lead, empty message) still surface as plain
/// HTTP errors; once the stream has started, failures become `error` events.
pub(crate) async fn stream_chat(state: GatewayState, body: ChatRequest) -> Response {
    let (lead_id, transcript) = match prepare_turn(&state, &body).await {
        Ok(prepared) => prepared,
        Err(e) => return error_response(&e),
    };

    let (tx, mut rx) = mpsc::channel::<String>(32);

    let runtime = state.runtime.clone();
    let tools = state.tools.clone();
    let system_prompt = state.system_prompt.clone();
    let handle = tokio::spawn(async move {
        run_turn(
            runtime.as_ref(),
            &tools,
            &system_prompt,
            transcript,
            Some(tx),
        )
        .await
    });

    let store = state.store.clone();
    let stream = async_stream::stream! {
        while let Some(delta) = rx.recv().await {
            yield Ok::<Event, Infallible>(
                Event::default()
                    .event("text_delta")
                    .data(serde_json::json!({ "text": delta }).to_string()),
            );
        }

        match handle.await {
            Ok(Ok(reply)) => {
                let persisted = store
                    .insert_message(&NewMessage {
                        lead_id,
                        content: reply.clone(),
                        direction: Direction::Outbound,
                    })
                    .await;
                match persisted {
                    Ok(_) => {
                        yield Ok(Event::default().event("message_stop").data(
                            serde_json::json!({
                                "content": reply,
                                "lead_id": lead_id.0,
                            })
                            .to_string(),
                        ));
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to persist streamed reply");
                        yield Ok(Event::default().event("error").data(
                            serde_json::json!({ "message": "internal server error" })
                                .to_string(),
                        ));
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "chat turn failed mid-stream");
                yield Ok(Event::default().event("error").data(
                    serde_json::json!({ "message": e.to_string() }).to_string(),
                ));
            }
            Err(e) => {
                warn!(error = %e, "chat turn task panicked");
                yield Ok(Event::default().event("error").data(
                    serde_json::json!({ "message": "turn task failed" }).to_string(),
                ));
            }
        }
    };

    Sse::new(stream).into_response()
}
