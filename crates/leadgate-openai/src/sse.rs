// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for Chat Completions streaming responses.
//!
//! The Chat Completions stream is data-only SSE: every event carries a JSON
//! chunk in its `data:` field and the stream terminates with the literal
//! `data: [DONE]`. Parsing uses the `eventsource-stream` crate for SSE
//! protocol compliance.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use leadgate_core::LeadgateError;

use crate::types::ChatCompletionChunk;

/// Typed events from the streaming protocol.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// One completion chunk.
    Chunk(ChatCompletionChunk),
    /// The `[DONE]` sentinel; no further events follow.
    Done,
}

/// Parses a reqwest streaming response into a stream of [`StreamEvent`]s.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LeadgateError>> + Send>> {
    parse_byte_stream(response.bytes_stream())
}

/// Parses any SSE byte stream into [`StreamEvent`]s. Split out from
/// [`parse_sse_stream`] so tests can feed scripted bytes.
pub fn parse_byte_stream<S, B, E>(
    bytes: S,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LeadgateError>> + Send>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let event_stream = bytes.eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                if event.data == "[DONE]" {
                    return Some(Ok(StreamEvent::Done));
                }
                let parsed = serde_json::from_str::<ChatCompletionChunk>(&event.data)
                    .map(StreamEvent::Chunk)
                    .map_err(|e| LeadgateError::Runtime {
                        message: format!("failed to parse completion chunk: {e}"),
                        source: Some(Box::new(e)),
                    });
                Some(parsed)
            }
            Err(e) => Some(Err(LeadgateError::Runtime {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn stream_of(text: &str) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LeadgateError>> + Send>>
    {
        let bytes = text.as_bytes().to_vec();
        parse_byte_stream(futures::stream::iter(vec![Ok::<_, Infallible>(bytes)]))
    }

    #[tokio::test]
    async fn parses_content_chunk() {
        let sse = "data: {\"id\":\"chatcmpl-1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Hi\"},\"finish_reason\":null}]}\n\n";
        let mut stream = stream_of(sse);

        let event = stream.next().await.unwrap().unwrap();
        match event {
            StreamEvent::Chunk(chunk) => {
                assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));
            }
            other => panic!("expected Chunk, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn done_sentinel_terminates() {
        let sse = "data: {\"id\":\"c\",\"choices\":[]}\n\ndata: [DONE]\n\n";
        let mut stream = stream_of(sse);

        assert!(matches!(
            stream.next().await.unwrap().unwrap(),
            StreamEvent::Chunk(_)
        ));
        assert!(matches!(
            stream.next().await.unwrap().unwrap(),
            StreamEvent::Done
        ));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn malformed_chunk_is_an_error() {
        let sse = "data: {not json}\n\n";
        let mut stream = stream_of(sse);

        let result = stream.next().await.unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn tool_call_fragments_parse_across_chunks() {
        let sse = concat!(
            "data: {\"id\":\"c\",\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"save_lead_info\",\"arguments\":\"\"}}]},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"c\",\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"email\\\":\"}}]},\"finish_reason\":null}]}\n\n",
            "data: {\"id\":\"c\",\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"\\\"a@x.com\\\"}\"}}]},\"finish_reason\":\"tool_calls\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        let mut stream = stream_of(sse);

        let mut fragments = Vec::new();
        while let Some(event) = stream.next().await {
            if let StreamEvent::Chunk(chunk) = event.unwrap()
                && let Some(calls) = &chunk.choices[0].delta.tool_calls
            {
                for call in calls {
                    if let Some(f) = &call.function
                        && let Some(args) = &f.arguments
                    {
                        fragments.push(args.clone());
                    }
                }
            }
        }
        assert_eq!(fragments.join(""), "{\"email\":\"a@x.com\"}");
    }
}
