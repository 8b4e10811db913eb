// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage trait for the lead store backing the resolver and gateway.

use async_trait::async_trait;

use crate::error::LeadgateError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Interaction, Lead, LeadId, LeadMessage, LeadPatch, LeadStatus, NewInteraction, NewLead,
    NewMessage, NewVisit, Visit,
};

/// Persistence operations for leads, transcripts, interactions, and visits.
///
/// The resolver is stateless and re-entrant: it takes a `&dyn LeadStore` on
/// every invocation and holds no lock across calls. Uniqueness of `email` and
/// `phone` is enforced by the backing store; write operations surface a
/// violation as [`LeadgateError::Conflict`] so callers can downgrade it into
/// a conflict outcome rather than treating it as fatal.
#[async_trait]
pub trait LeadStore: PluginAdapter {
    /// Initializes the backend (migrations, connection, pragmas).
    async fn initialize(&self) -> Result<(), LeadgateError>;

    /// Flushes pending writes and releases the connection.
    async fn close(&self) -> Result<(), LeadgateError>;

    // --- Lead operations ---

    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, LeadgateError>;

    /// Exact match on the unique `email` column.
    async fn find_lead_by_email(&self, email: &str) -> Result<Option<Lead>, LeadgateError>;

    /// Exact match on the unique `phone` column.
    async fn find_lead_by_phone(&self, phone: &str) -> Result<Option<Lead>, LeadgateError>;

    /// Inserts a new lead with `status = new`. Returns [`LeadgateError::Conflict`]
    /// when another lead already owns the supplied email or phone.
    async fn insert_lead(&self, lead: &NewLead) -> Result<LeadId, LeadgateError>;

    /// Applies a partial update; unset patch fields are left untouched.
    /// Returns [`LeadgateError::Conflict`] on a unique-constraint violation,
    /// in which case no column of the patch is persisted.
    async fn update_lead(&self, id: LeadId, patch: &LeadPatch) -> Result<(), LeadgateError>;

    /// Explicit lifecycle transition (admin action, never the resolver).
    async fn update_lead_status(
        &self,
        id: LeadId,
        status: LeadStatus,
    ) -> Result<(), LeadgateError>;

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, LeadgateError>;

    // --- Transcript operations (append-only) ---

    async fn insert_message(&self, message: &NewMessage) -> Result<i64, LeadgateError>;

    async fn messages_for_lead(
        &self,
        lead_id: LeadId,
        limit: Option<i64>,
    ) -> Result<Vec<LeadMessage>, LeadgateError>;

    // --- Interaction operations ---

    async fn insert_interaction(&self, rec: &NewInteraction) -> Result<i64, LeadgateError>;

    async fn interactions_for_lead(
        &self,
        lead_id: LeadId,
    ) -> Result<Vec<Interaction>, LeadgateError>;

    // --- Visitor attribution ---

    async fn record_visit(&self, visit: &NewVisit) -> Result<i64, LeadgateError>;

    async fn recent_visits(&self, limit: i64) -> Result<Vec<Visit>, LeadgateError>;
}
