// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::path::Path;

use tracing::debug;

use leadgate_core::{ContactField, LeadgateError};

/// Handle to the SQLite database.
///
/// Wraps a [`tokio_rusqlite::Connection`] whose background thread serializes
/// all access. Opening runs PRAGMA setup and all pending migrations.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode enabled.
    pub async fn open(path: &str) -> Result<Self, LeadgateError> {
        Self::open_with(path, true).await
    }

    /// Open (or create) the database at `path`.
    ///
    /// Creates parent directories as needed, applies connection PRAGMAs, and
    /// runs embedded migrations before returning.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, LeadgateError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| LeadgateError::Storage {
                source: Box::new(e),
            })?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(map_tr_err)?;

        let journal_mode = if wal_mode { "WAL" } else { "DELETE" };
        let pragmas = format!(
            "PRAGMA journal_mode = {journal_mode};
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;"
        );
        conn.call(move |conn| {
            conn.execute_batch(&pragmas)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| {
            crate::migrations::run_migrations(conn)
                .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// Access the underlying connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), LeadgateError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the generic storage error.
pub fn map_tr_err(err: tokio_rusqlite::Error) -> LeadgateError {
    LeadgateError::Storage {
        source: Box::new(err),
    }
}

/// Map a write error against the `leads` table, classifying UNIQUE
/// constraint violations on the contact columns as [`LeadgateError::Conflict`].
///
/// Any other error is reported as a plain storage error.
pub fn map_lead_write_err(err: tokio_rusqlite::Error) -> LeadgateError {
    if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(code, Some(message))) =
        &err
        && code.code == rusqlite::ErrorCode::ConstraintViolation
    {
        if message.contains("leads.email") {
            return LeadgateError::Conflict {
                field: ContactField::Email,
            };
        }
        if message.contains("leads.phone") {
            return LeadgateError::Conflict {
                field: ContactField::Phone,
            };
        }
    }
    map_tr_err(err)
}
