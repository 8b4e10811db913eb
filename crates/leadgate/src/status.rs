// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadgate status` command implementation.
//!
//! Probes the gateway health endpoint and reads lead pipeline counts from
//! the local database. Degrades gracefully when the server is not running.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use leadgate_config::model::LeadgateConfig;
use leadgate_core::{LeadStatus, LeadStore, LeadgateError};
use leadgate_storage::SqliteStore;

/// Health endpoint response from the gateway.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    uptime_secs: u64,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
struct StatusResponse {
    running: bool,
    uptime_secs: Option<u64>,
    uptime_human: Option<String>,
    gateway_host: String,
    gateway_port: u16,
    leads: LeadCounts,
}

#[derive(Debug, Serialize)]
struct LeadCounts {
    new: usize,
    in_progress: usize,
    converted: usize,
    lost: usize,
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Run the `leadgate status` command.
pub async fn run_status(config: &LeadgateConfig, json: bool) -> Result<(), LeadgateError> {
    let host = &config.gateway.host;
    let port = config.gateway.port;
    let url = format!("http://{host}:{port}/health");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .map_err(|e| LeadgateError::Internal(format!("failed to create HTTP client: {e}")))?;

    let health = match client.get(&url).send().await {
        Ok(resp) if resp.status().is_success() => resp.json::<HealthResponse>().await.ok(),
        _ => None,
    };

    let leads = read_lead_counts(config).await?;

    let response = StatusResponse {
        running: health.is_some(),
        uptime_secs: health.as_ref().map(|h| h.uptime_secs),
        uptime_human: health.as_ref().map(|h| format_uptime(h.uptime_secs)),
        gateway_host: host.clone(),
        gateway_port: port,
        leads,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&response).map_err(
            |e| LeadgateError::Internal(format!("failed to serialize status: {e}")),
        )?);
        return Ok(());
    }

    match (&health, &response.uptime_human) {
        (Some(h), Some(uptime)) => {
            println!("leadgate: {} (up {uptime})", h.status);
        }
        _ => {
            println!("leadgate: not running (no gateway at {host}:{port})");
        }
    }
    println!(
        "leads: {} new, {} in-progress, {} converted, {} lost",
        response.leads.new,
        response.leads.in_progress,
        response.leads.converted,
        response.leads.lost
    );

    Ok(())
}

/// Count leads per pipeline stage from the local database.
async fn read_lead_counts(config: &LeadgateConfig) -> Result<LeadCounts, LeadgateError> {
    let store = SqliteStore::new(config.storage.clone());
    store.initialize().await?;

    async fn count(store: &SqliteStore, status: LeadStatus) -> Result<usize, LeadgateError> {
        Ok(store.list_leads(Some(status)).await?.len())
    }

    let counts = LeadCounts {
        new: count(&store, LeadStatus::New).await?,
        in_progress: count(&store, LeadStatus::InProgress).await?,
        converted: count(&store, LeadStatus::Converted).await?,
        lost: count(&store, LeadStatus::Lost).await?,
    };

    store.close().await?;
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formats_scale_with_duration() {
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(3 * 60), "3m");
        assert_eq!(format_uptime(2 * 3600 + 5 * 60), "2h 5m");
        assert_eq!(format_uptime(86400 + 3600 + 60), "1d 1h 1m");
    }

    #[tokio::test]
    async fn lead_counts_read_from_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = LeadgateConfig {
            storage: leadgate_config::model::StorageConfig {
                database_path: dir
                    .path()
                    .join("status.db")
                    .to_str()
                    .unwrap()
                    .to_string(),
                wal_mode: true,
            },
            ..LeadgateConfig::default()
        };
        let counts = read_lead_counts(&config).await.unwrap();
        assert_eq!(counts.new, 0);
        assert_eq!(counts.converted, 0);
    }
}
