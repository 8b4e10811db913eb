// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Leadgate server.

use thiserror::Error;

use crate::types::ContactField;

/// The primary error type used across all Leadgate adapter traits and core operations.
#[derive(Debug, Error)]
pub enum LeadgateError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Input rejected before any store access (missing channel, empty payload).
    #[error("validation error: {0}")]
    Validation(String),

    /// Storage backend errors (database connection, query failure, rollback).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A uniqueness constraint on a contact field was violated at write time.
    ///
    /// Surfaced by the storage layer so the resolver can downgrade it into a
    /// `ConflictEmail`/`ConflictPhone` outcome instead of failing the call.
    #[error("unique constraint violated for {field}")]
    Conflict { field: ContactField },

    /// Agent runtime errors (API failure, malformed stream, model not found).
    #[error("runtime error: {message}")]
    Runtime {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Channel-facing errors (bind failure, closed connection, bad transport state).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LeadgateError {
    /// True when the error is a contact-field uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LeadgateError::Conflict { .. })
    }
}
