// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent-side plumbing for the Leadgate server: the tool trait and registry,
//! the `save_lead_info` capture tool, and the turn loop that connects a
//! streaming runtime to tool execution.

pub mod save_lead;
pub mod tool;
pub mod turn;

pub use save_lead::{SaveLeadTool, resolution_message};
pub use tool::{Tool, ToolOutput, ToolRegistry};
pub use turn::run_turn;
