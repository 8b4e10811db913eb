// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool trait and registry.
//!
//! The [`Tool`] trait defines the unified interface the agent loop uses to
//! execute model-requested function calls. The [`ToolRegistry`] manages tool
//! lookup by name and generates OpenAI-format function definitions for the
//! runtime request.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use leadgate_core::LeadgateError;
use serde::{Deserialize, Serialize};

/// Output from a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The content returned by the tool (plain text for the model).
    pub content: String,
    /// Whether the tool invocation resulted in an error.
    pub is_error: bool,
}

/// Unified trait for all tools.
///
/// Every tool provides a name, description, JSON Schema for its parameters,
/// and an async `invoke` method. The agent loop calls `invoke` with the
/// parsed JSON arguments from the model's function call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's unique name (used for lookup and API serialization).
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// Returns the JSON Schema describing the tool's input parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Invokes the tool with the given JSON input and returns the output.
    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, LeadgateError>;
}

/// Registry of available tools, indexed by name.
///
/// The registry provides tool lookup for the agent loop and generates
/// OpenAI-format function definition arrays for the runtime request.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool. The tool is indexed by its `name()`.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Looks up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Returns (name, description) pairs for all registered tools.
    pub fn list(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .tools
            .values()
            .map(|t| (t.name(), t.description()))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }

    /// Returns OpenAI-format function definitions for all registered tools.
    ///
    /// Each definition has the shape:
    /// ```json
    /// {
    ///   "type": "function",
    ///   "function": {
    ///     "name": "tool_name",
    ///     "description": "What the tool does",
    ///     "parameters": { ... JSON Schema ... }
    ///   }
    /// }
    /// ```
    pub fn tool_definitions(&self) -> Vec<serde_json::Value> {
        let mut defs: Vec<serde_json::Value> = self
            .tools
            .values()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.parameters_schema(),
                    },
                })
            })
            .collect();
        defs.sort_by(|a, b| {
            a["function"]["name"]
                .as_str()
                .unwrap_or("")
                .cmp(b["function"]["name"].as_str().unwrap_or(""))
        });
        defs
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
