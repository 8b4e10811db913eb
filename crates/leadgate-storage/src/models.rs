// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types stored by this crate.
//!
//! The persisted shapes are the shared domain types; this module re-exports
//! them so query modules and downstream crates have a single import path.

pub use leadgate_core::{
    Direction, Interaction, Lead, LeadId, LeadMessage, LeadPatch, LeadStatus, NewInteraction,
    NewLead, NewMessage, NewVisit, SourceChannel, Visit,
};
