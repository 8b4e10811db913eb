// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Leadgate lead-capture server.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain model used throughout the Leadgate workspace: the lead record and
//! its merge contract, the storage seam, and the agent runtime seam.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::LeadgateError;
pub use types::{
    AdapterType, ChatRole, ChatTurn, ContactField, Direction, HealthStatus, Interaction, Lead,
    LeadId, LeadMessage, LeadPatch, LeadStatus, MergeOutcome, NamePolicy, NewInteraction, NewLead,
    NewMessage, NewVisit, Resolution, ResolveRequest, SourceChannel, ToolCallRequest, TurnEvent,
    TurnRequest, TurnStream, UNKNOWN_NAME, Visit,
};

// Re-export all adapter traits at crate root.
pub use traits::{AgentRuntime, LeadStore, PluginAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_variants_construct() {
        let _config = LeadgateError::Config("test".into());
        let _validation = LeadgateError::Validation("test".into());
        let _storage = LeadgateError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let conflict = LeadgateError::Conflict {
            field: ContactField::Email,
        };
        assert!(conflict.is_conflict());
        let _runtime = LeadgateError::Runtime {
            message: "test".into(),
            source: None,
        };
        let _channel = LeadgateError::Channel {
            message: "test".into(),
            source: None,
        };
        let _timeout = LeadgateError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _internal = LeadgateError::Internal("test".into());
    }

    #[test]
    fn conflict_error_names_the_field() {
        let err = LeadgateError::Conflict {
            field: ContactField::Phone,
        };
        assert_eq!(err.to_string(), "unique constraint violated for phone");
        assert!(!LeadgateError::Validation("x".into()).is_conflict());
    }

    #[test]
    fn merge_outcome_covers_spec_surface() {
        let outcomes = [
            MergeOutcome::Created,
            MergeOutcome::Updated,
            MergeOutcome::ConflictEmail,
            MergeOutcome::ConflictPhone,
        ];
        assert_eq!(outcomes.len(), 4);
    }

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that the adapter seams are reachable through
        // the public API.
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_lead_store<T: LeadStore>() {}
        fn _assert_agent_runtime<T: AgentRuntime>() {}
    }
}
