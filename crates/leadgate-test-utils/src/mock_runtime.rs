// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock agent runtime for deterministic testing.
//!
//! `MockRuntime` implements `AgentRuntime` with pre-scripted event batches,
//! enabling fast, CI-runnable tests without external API calls.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use leadgate_core::{
    AdapterType, AgentRuntime, HealthStatus, LeadgateError, PluginAdapter, TurnEvent, TurnRequest,
    TurnStream,
};

/// A mock runtime that replays pre-scripted turn event batches.
///
/// Each `stream_turn` call pops one batch from a FIFO queue. When the queue
/// is empty, a default single-text-delta turn is returned. Every received
/// request is recorded for assertion.
pub struct MockRuntime {
    scripts: Arc<Mutex<VecDeque<Vec<TurnEvent>>>>,
    requests: Arc<Mutex<Vec<TurnRequest>>>,
}

impl MockRuntime {
    /// Create a new mock runtime with an empty script queue.
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock runtime pre-loaded with the given event batches.
    pub fn with_scripts(scripts: Vec<Vec<TurnEvent>>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(VecDeque::from(scripts))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Convenience: one batch that streams `text` and finishes.
    pub fn text_turn(text: &str) -> Vec<TurnEvent> {
        vec![
            TurnEvent::TextDelta(text.to_string()),
            TurnEvent::Done,
        ]
    }

    /// Append an event batch to the queue.
    pub async fn add_script(&self, events: Vec<TurnEvent>) {
        self.scripts.lock().await.push_back(events);
    }

    /// All turn requests received so far.
    pub async fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockRuntime {
    fn name(&self) -> &str {
        "mock-runtime"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Runtime
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadgateError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl AgentRuntime for MockRuntime {
    async fn stream_turn(&self, request: TurnRequest) -> Result<TurnStream, LeadgateError> {
        self.requests.lock().await.push(request);
        let events = self
            .scripts
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Self::text_turn("mock response"));
        Ok(Box::pin(futures::stream::iter(events.into_iter().map(Ok))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn scripts_are_replayed_in_order() {
        let runtime = MockRuntime::with_scripts(vec![
            MockRuntime::text_turn("first"),
            MockRuntime::text_turn("second"),
        ]);

        for expected in ["first", "second", "mock response"] {
            let mut stream = runtime
                .stream_turn(TurnRequest {
                    system_prompt: String::new(),
                    messages: vec![],
                    tools: vec![],
                })
                .await
                .unwrap();
            match stream.next().await.unwrap().unwrap() {
                TurnEvent::TextDelta(text) => assert_eq!(text, expected),
                other => panic!("expected TextDelta, got {other:?}"),
            }
        }

        assert_eq!(runtime.requests().await.len(), 3);
    }
}
