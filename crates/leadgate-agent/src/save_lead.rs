// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `save_lead_info` tool.
//!
//! Thin adapter between a model function call and the identity resolver.
//! The conversational runtimes only ever see the plain-text result string;
//! conflicts and storage failures are reported in-band with an `error:`
//! prefix so the model can relay them without crashing the session.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::error;

use leadgate_core::{
    LeadStore, LeadgateError, MergeOutcome, NamePolicy, Resolution, ResolveRequest, SourceChannel,
};
use leadgate_resolver::resolve_and_merge;

use crate::tool::{Tool, ToolOutput};

/// Render a resolver result as the plain-text string shown to models and
/// form callers. Returns the text plus whether it describes a conflict.
pub fn resolution_message(res: &Resolution) -> (String, bool) {
    match res.outcome {
        MergeOutcome::Created => (format!("Lead saved (id={})", res.lead_id), false),
        MergeOutcome::Updated => (format!("Lead updated (id={})", res.lead_id), false),
        MergeOutcome::ConflictEmail => (
            format!(
                "error: that email is already linked to a different lead; \
                 other details were saved (id={})",
                res.lead_id
            ),
            true,
        ),
        MergeOutcome::ConflictPhone => (
            format!(
                "error: that phone number is already linked to a different lead; \
                 other details were saved (id={})",
                res.lead_id
            ),
            true,
        ),
    }
}

/// Arguments the model supplies to `save_lead_info`. All fields optional;
/// the resolver rejects a fully empty request.
#[derive(Debug, Deserialize)]
struct SaveLeadArgs {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    problem: Option<String>,
}

/// Captures contact details from a conversation into the lead store.
///
/// One instance per capture channel; the channel is fixed at construction so
/// the model cannot spoof attribution.
pub struct SaveLeadTool {
    store: Arc<dyn LeadStore>,
    policy: NamePolicy,
    source: SourceChannel,
}

impl SaveLeadTool {
    pub fn new(store: Arc<dyn LeadStore>, policy: NamePolicy, source: SourceChannel) -> Self {
        Self {
            store,
            policy,
            source,
        }
    }
}

#[async_trait]
impl Tool for SaveLeadTool {
    fn name(&self) -> &str {
        "save_lead_info"
    }

    fn description(&self) -> &str {
        "Save or update the visitor's contact details (name, email, phone) and \
         the problem they need help with. Call this as soon as any contact \
         detail is mentioned; repeated calls update the same lead."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The visitor's name"
                },
                "email": {
                    "type": "string",
                    "description": "The visitor's email address"
                },
                "phone": {
                    "type": "string",
                    "description": "The visitor's phone number"
                },
                "problem": {
                    "type": "string",
                    "description": "Short description of the problem or project"
                }
            }
        })
    }

    async fn invoke(&self, input: serde_json::Value) -> Result<ToolOutput, LeadgateError> {
        let args: SaveLeadArgs = match serde_json::from_value(input) {
            Ok(args) => args,
            Err(e) => {
                return Ok(ToolOutput {
                    content: format!("error: invalid arguments: {e}"),
                    is_error: true,
                });
            }
        };

        let request = ResolveRequest::new(
            args.name,
            args.email,
            args.phone,
            args.problem,
            self.source,
        );

        let output = match resolve_and_merge(self.store.as_ref(), self.policy, &request).await {
            Ok(res) => {
                let (content, is_error) = resolution_message(&res);
                ToolOutput { content, is_error }
            }
            Err(LeadgateError::Validation(msg)) => ToolOutput {
                content: format!("error: {msg}"),
                is_error: true,
            },
            Err(e) => {
                error!(error = %e, "save_lead_info failed");
                ToolOutput {
                    content: "error: could not save lead details".to_string(),
                    is_error: true,
                }
            }
        };
        Ok(output)
    }
}
