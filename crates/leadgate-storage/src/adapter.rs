// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the LeadStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use leadgate_config::model::StorageConfig;
use leadgate_core::{
    AdapterType, HealthStatus, Interaction, Lead, LeadId, LeadMessage, LeadPatch, LeadStatus,
    LeadStore, LeadgateError, NewInteraction, NewLead, NewMessage, NewVisit, PluginAdapter, Visit,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed lead store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`LeadStore::initialize`].
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given configuration.
    ///
    /// The database connection is not opened until [`LeadStore::initialize`]
    /// is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, LeadgateError> {
        self.db.get().ok_or_else(|| LeadgateError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadgateError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LeadgateError> {
        // Shutdown delegates to close if the DB was initialized.
        if self.db.get().is_some() {
            self.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl LeadStore for SqliteStore {
    async fn initialize(&self) -> Result<(), LeadgateError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| LeadgateError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite lead store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), LeadgateError> {
        let db = self.db()?;
        // Checkpoint WAL; the connection itself is dropped with the store.
        db.connection()
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Lead operations ---

    async fn get_lead(&self, id: LeadId) -> Result<Option<Lead>, LeadgateError> {
        queries::leads::get_lead(self.db()?, id).await
    }

    async fn find_lead_by_email(&self, email: &str) -> Result<Option<Lead>, LeadgateError> {
        queries::leads::find_by_email(self.db()?, email).await
    }

    async fn find_lead_by_phone(&self, phone: &str) -> Result<Option<Lead>, LeadgateError> {
        queries::leads::find_by_phone(self.db()?, phone).await
    }

    async fn insert_lead(&self, lead: &NewLead) -> Result<LeadId, LeadgateError> {
        queries::leads::insert_lead(self.db()?, lead).await
    }

    async fn update_lead(&self, id: LeadId, patch: &LeadPatch) -> Result<(), LeadgateError> {
        queries::leads::update_lead(self.db()?, id, patch).await
    }

    async fn update_lead_status(
        &self,
        id: LeadId,
        status: LeadStatus,
    ) -> Result<(), LeadgateError> {
        queries::leads::update_status(self.db()?, id, status).await
    }

    async fn list_leads(&self, status: Option<LeadStatus>) -> Result<Vec<Lead>, LeadgateError> {
        queries::leads::list_leads(self.db()?, status).await
    }

    // --- Transcript operations ---

    async fn insert_message(&self, message: &NewMessage) -> Result<i64, LeadgateError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn messages_for_lead(
        &self,
        lead_id: LeadId,
        limit: Option<i64>,
    ) -> Result<Vec<LeadMessage>, LeadgateError> {
        queries::messages::messages_for_lead(self.db()?, lead_id, limit).await
    }

    // --- Interaction operations ---

    async fn insert_interaction(&self, rec: &NewInteraction) -> Result<i64, LeadgateError> {
        queries::interactions::insert_interaction(self.db()?, rec).await
    }

    async fn interactions_for_lead(
        &self,
        lead_id: LeadId,
    ) -> Result<Vec<Interaction>, LeadgateError> {
        queries::interactions::interactions_for_lead(self.db()?, lead_id).await
    }

    // --- Visitor attribution ---

    async fn record_visit(&self, visit: &NewVisit) -> Result<i64, LeadgateError> {
        queries::visitors::record_visit(self.db()?, visit).await
    }

    async fn recent_visits(&self, limit: i64) -> Result<Vec<Visit>, LeadgateError> {
        queries::visitors::recent_visits(self.db()?, limit).await
    }
}
