// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait shared by the storage and agent runtime seams.

use async_trait::async_trait;

use crate::error::LeadgateError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health, and lifecycle surface common to all adapters.
///
/// The server wires adapters by their concrete trait (`LeadStore`,
/// `AgentRuntime`); this base trait is what lets it report on and tear
/// them down uniformly.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Which seam this adapter fills.
    fn adapter_type(&self) -> AdapterType;

    /// Probes the adapter and reports its current status.
    async fn health_check(&self) -> Result<HealthStatus, LeadgateError>;

    /// Releases held resources. Adapters with no teardown keep the default.
    async fn shutdown(&self) -> Result<(), LeadgateError> {
        Ok(())
    }
}
