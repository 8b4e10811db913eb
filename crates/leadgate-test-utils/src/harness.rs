// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration test harness wiring a real SQLite store to a mock runtime.

use std::sync::Arc;

use tempfile::TempDir;

use leadgate_agent::{SaveLeadTool, ToolRegistry, run_turn};
use leadgate_config::model::StorageConfig;
use leadgate_core::{
    ChatTurn, Direction, LeadId, LeadStore, LeadgateError, NamePolicy, NewMessage, SourceChannel,
    TurnEvent,
};
use leadgate_storage::SqliteStore;

use crate::mock_runtime::MockRuntime;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant for a marketing site.";

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    scripts: Vec<Vec<TurnEvent>>,
    system_prompt: String,
    policy: NamePolicy,
}

impl TestHarnessBuilder {
    pub fn new() -> Self {
        Self {
            scripts: Vec::new(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            policy: NamePolicy::default(),
        }
    }

    /// Queue a scripted event batch on the mock runtime.
    pub fn with_script(mut self, events: Vec<TurnEvent>) -> Self {
        self.scripts.push(events);
        self
    }

    /// Queue a plain text reply on the mock runtime.
    pub fn with_text_reply(mut self, text: &str) -> Self {
        self.scripts.push(MockRuntime::text_turn(text));
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    pub fn with_name_policy(mut self, policy: NamePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the harness: tempdir-backed SQLite store (migrated), mock
    /// runtime, and a tool registry holding the chat capture tool.
    pub async fn build(self) -> Result<TestHarness, LeadgateError> {
        let temp_dir = TempDir::new().map_err(|e| LeadgateError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("leadgate.db");

        let store = Arc::new(SqliteStore::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        store.initialize().await?;

        let runtime = Arc::new(MockRuntime::with_scripts(self.scripts));

        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(SaveLeadTool::new(
            store.clone(),
            self.policy,
            SourceChannel::Chat,
        )));

        Ok(TestHarness {
            store,
            runtime,
            tools: Arc::new(tools),
            system_prompt: self.system_prompt,
            policy: self.policy,
            _temp_dir: temp_dir,
        })
    }
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully wired test environment: real SQLite storage in a tempdir plus a
/// scripted mock runtime. Dropping the harness removes the database.
pub struct TestHarness {
    pub store: Arc<SqliteStore>,
    pub runtime: Arc<MockRuntime>,
    pub tools: Arc<ToolRegistry>,
    pub system_prompt: String,
    pub policy: NamePolicy,
    _temp_dir: TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Drive one chat turn for the given lead: persist the inbound message,
    /// replay the transcript through the runtime, persist the reply.
    pub async fn send_chat(
        &self,
        lead_id: LeadId,
        message: &str,
    ) -> Result<String, LeadgateError> {
        self.store
            .insert_message(&NewMessage {
                lead_id,
                content: message.to_string(),
                direction: Direction::Inbound,
            })
            .await?;

        let transcript: Vec<ChatTurn> = self
            .store
            .messages_for_lead(lead_id, None)
            .await?
            .into_iter()
            .map(|m| match m.direction {
                Direction::Inbound => ChatTurn::user(m.content),
                Direction::Outbound => ChatTurn::assistant(m.content),
            })
            .collect();

        let reply = run_turn(
            self.runtime.as_ref(),
            &self.tools,
            &self.system_prompt,
            transcript,
            None,
        )
        .await?;

        self.store
            .insert_message(&NewMessage {
                lead_id,
                content: reply.clone(),
                direction: Direction::Outbound,
            })
            .await?;

        Ok(reply)
    }
}
