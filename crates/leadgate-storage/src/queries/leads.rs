// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead CRUD operations.
//!
//! The UNIQUE constraints on `email` and `phone` are enforced here at write
//! time; violations surface as [`LeadgateError::Conflict`] so callers can
//! downgrade a racing write into a merge instead of crashing.

use leadgate_core::LeadgateError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Lead, LeadId, LeadPatch, LeadStatus, NewLead};
use crate::queries::parse_column;

const LEAD_COLUMNS: &str = "id, name, email, phone, problem, source, status, created_at, updated_at";

fn read_lead(row: &rusqlite::Row<'_>) -> Result<Lead, rusqlite::Error> {
    let source_raw: String = row.get(5)?;
    let status_raw: String = row.get(6)?;
    Ok(Lead {
        id: LeadId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        problem: row.get(4)?,
        source: parse_column(5, &source_raw)?,
        status: parse_column(6, &status_raw)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Insert a new lead with `status = new`.
///
/// Returns [`LeadgateError::Conflict`] when another lead already owns the
/// supplied email or phone; no row is inserted in that case.
pub async fn insert_lead(db: &Database, lead: &NewLead) -> Result<LeadId, LeadgateError> {
    let lead = lead.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO leads (name, email, phone, problem, source, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'new',
                         strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                         strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                params![
                    lead.name,
                    lead.email,
                    lead.phone,
                    lead.problem,
                    lead.source.to_string(),
                ],
            )?;
            Ok(LeadId(conn.last_insert_rowid()))
        })
        .await
        .map_err(crate::database::map_lead_write_err)
}

/// Get a lead by ID.
pub async fn get_lead(db: &Database, id: LeadId) -> Result<Option<Lead>, LeadgateError> {
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"))?;
            let result = stmt.query_row(params![id.0], read_lead);
            match result {
                Ok(lead) => Ok(Some(lead)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find a lead by exact email match.
pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<Lead>, LeadgateError> {
    let email = email.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE email = ?1"))?;
            let result = stmt.query_row(params![email], read_lead);
            match result {
                Ok(lead) => Ok(Some(lead)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find a lead by exact phone match.
pub async fn find_by_phone(db: &Database, phone: &str) -> Result<Option<Lead>, LeadgateError> {
    let phone = phone.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {LEAD_COLUMNS} FROM leads WHERE phone = ?1"))?;
            let result = stmt.query_row(params![phone], read_lead);
            match result {
                Ok(lead) => Ok(Some(lead)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a partial update to a lead.
///
/// Unset patch fields leave the stored columns untouched (COALESCE keeps the
/// existing value when the bound parameter is NULL). On a UNIQUE violation
/// the whole statement fails atomically and no column of the patch persists;
/// the error is classified as [`LeadgateError::Conflict`].
pub async fn update_lead(db: &Database, id: LeadId, patch: &LeadPatch) -> Result<(), LeadgateError> {
    if patch.is_empty() {
        return Ok(());
    }
    let patch = patch.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE leads SET
                     name = COALESCE(?1, name),
                     email = COALESCE(?2, email),
                     phone = COALESCE(?3, phone),
                     problem = COALESCE(?4, problem),
                     source = COALESCE(?5, source),
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?6",
                params![
                    patch.name,
                    patch.email,
                    patch.phone,
                    patch.problem,
                    patch.source.map(|s| s.to_string()),
                    id.0,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_lead_write_err)
}

/// Set a lead's lifecycle status.
pub async fn update_status(
    db: &Database,
    id: LeadId,
    status: LeadStatus,
) -> Result<(), LeadgateError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE leads SET status = ?1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?2",
                params![status.to_string(), id.0],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List leads, optionally filtered by status, newest first.
pub async fn list_leads(
    db: &Database,
    status: Option<LeadStatus>,
) -> Result<Vec<Lead>, LeadgateError> {
    db.connection()
        .call(move |conn| {
            let mut leads = Vec::new();
            match status {
                Some(filter) => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {LEAD_COLUMNS} FROM leads WHERE status = ?1
                         ORDER BY created_at DESC, id DESC"
                    ))?;
                    let rows = stmt.query_map(params![filter.to_string()], read_lead)?;
                    for row in rows {
                        leads.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT {LEAD_COLUMNS} FROM leads ORDER BY created_at DESC, id DESC"
                    ))?;
                    let rows = stmt.query_map([], read_lead)?;
                    for row in rows {
                        leads.push(row?);
                    }
                }
            }
            Ok(leads)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
