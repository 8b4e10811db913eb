// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Leadgate server.

use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::LeadgateError;

/// Placeholder stored in `Lead::name` until a real name is captured.
/// Compared case-insensitively by the resolver's name merge policy.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Surrogate identifier of a lead row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub i64);

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a [`crate::PluginAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum AdapterType {
    Runtime,
    Storage,
}

/// Origin of an interaction, recorded on the lead for attribution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SourceChannel {
    Voice,
    Chat,
    Form,
}

/// Lead lifecycle status. Only moves by explicit external action (admin
/// routes), never by the resolver.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum LeadStatus {
    #[serde(rename = "new")]
    #[strum(serialize = "new")]
    New,
    #[serde(rename = "in-progress")]
    #[strum(serialize = "in-progress")]
    InProgress,
    #[serde(rename = "converted")]
    #[strum(serialize = "converted")]
    Converted,
    #[serde(rename = "lost")]
    #[strum(serialize = "lost")]
    Lost,
}

/// The two uniqueness-bearing contact fields of a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContactField {
    Email,
    Phone,
}

/// How the resolver treats a candidate name against an already-stored one.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
pub enum NamePolicy {
    /// A real (non-sentinel) stored name is never overwritten.
    #[default]
    #[serde(rename = "first-wins")]
    #[strum(serialize = "first-wins")]
    FirstWins,
    /// The latest non-empty candidate name always wins.
    #[serde(rename = "last-wins")]
    #[strum(serialize = "last-wins")]
    LastWins,
}

/// One prospective customer contact record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    /// Never null; [`UNKNOWN_NAME`] until a real name is captured.
    pub name: String,
    /// Unique across leads when present.
    pub email: Option<String>,
    /// Unique across leads when present.
    pub phone: Option<String>,
    /// Free-text problem statement; latest value wins.
    pub problem: Option<String>,
    /// Channel of the most recent merge.
    pub source: SourceChannel,
    pub status: LeadStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for inserting a new lead row.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub problem: Option<String>,
    pub source: SourceChannel,
}

/// A partial update applied to an existing lead. `None` leaves the stored
/// column untouched.
#[derive(Debug, Clone, Default)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub problem: Option<String>,
    pub source: Option<SourceChannel>,
}

impl LeadPatch {
    /// True when no column would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.problem.is_none()
            && self.source.is_none()
    }

    /// Drop the given contact field from the patch (conflict downgrade).
    pub fn clear(&mut self, field: ContactField) {
        match field {
            ContactField::Email => self.email = None,
            ContactField::Phone => self.phone = None,
        }
    }
}

/// Message direction relative to the lead.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One transcript utterance tied to a lead. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadMessage {
    pub id: i64,
    pub lead_id: LeadId,
    pub content: String,
    pub direction: Direction,
    pub created_at: String,
}

/// Fields for appending a new transcript message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub lead_id: LeadId,
    pub content: String,
    pub direction: Direction,
}

/// A manual CRM touchpoint recorded against a lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: i64,
    pub lead_id: LeadId,
    /// e.g. `call`, `email`, `meeting`, `chat`.
    pub kind: String,
    pub notes: Option<String>,
    pub outcome: Option<String>,
    pub created_at: String,
}

/// Fields for recording a new interaction.
#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub lead_id: LeadId,
    pub kind: String,
    pub notes: Option<String>,
    pub outcome: Option<String>,
}

/// One recorded website visit with attribution parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Visit {
    pub id: i64,
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub path: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub created_at: String,
}

/// Fields for appending a visit row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVisit {
    pub ip_address: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub path: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

// --- Resolver contract ---

/// Candidate contact attributes supplied to the resolver.
///
/// All strings are surrounding-whitespace trimmed by [`ResolveRequest::new`];
/// values that trim to empty are normalized to `None`.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub problem: Option<String>,
    pub source: SourceChannel,
}

impl ResolveRequest {
    /// Build a request, trimming inputs and dropping empties.
    pub fn new(
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        problem: Option<String>,
        source: SourceChannel,
    ) -> Self {
        Self {
            name: normalize(name),
            email: normalize(email),
            phone: normalize(phone),
            problem: normalize(problem),
            source,
        }
    }

    /// True when no usable attribute was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.problem.is_none()
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    let trimmed = value?.trim().to_string();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// How a resolver invocation concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum MergeOutcome {
    /// A new lead row was inserted.
    Created,
    /// An existing lead absorbed the supplied attributes.
    Updated,
    /// Another lead already owns the candidate email; that field was dropped.
    ConflictEmail,
    /// Another lead already owns the candidate phone; that field was dropped.
    ConflictPhone,
}

/// Successful resolver result: the persisted lead plus how the call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub lead_id: LeadId,
    pub outcome: MergeOutcome,
}

// --- Agent runtime contract ---

/// Role of one transcript entry sent to the agent runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry of the conversation transcript passed to the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    /// Set on `Tool` turns: which call this result answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Set on `Assistant` turns that requested tools (provider wire format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<serde_json::Value>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            tool_call_id: None,
            tool_calls: None,
        }
    }
}

/// One turn request sent to the agent runtime.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatTurn>,
    /// Tool definitions in the runtime's wire format.
    pub tools: Vec<serde_json::Value>,
}

/// A tool invocation requested by the runtime mid-turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRequest {
    /// Provider-assigned call identifier, echoed back with the result.
    pub id: String,
    pub name: String,
    /// Parsed JSON arguments.
    pub arguments: serde_json::Value,
}

/// Events yielded while streaming one agent turn.
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// Incremental assistant text.
    TextDelta(String),
    /// The runtime requests a tool invocation.
    ToolCall(ToolCallRequest),
    /// The turn finished; no further events follow.
    Done,
}

/// Boxed stream of turn events from an agent runtime.
pub type TurnStream = Pin<Box<dyn Stream<Item = Result<TurnEvent, LeadgateError>> + Send>>;
