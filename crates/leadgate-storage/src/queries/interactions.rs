// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manual CRM touchpoint records (calls, emails, meetings).

use leadgate_core::LeadgateError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Interaction, LeadId, NewInteraction};

fn read_interaction(row: &rusqlite::Row<'_>) -> Result<Interaction, rusqlite::Error> {
    Ok(Interaction {
        id: row.get(0)?,
        lead_id: LeadId(row.get(1)?),
        kind: row.get(2)?,
        notes: row.get(3)?,
        outcome: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Record an interaction against a lead. Returns the new row id.
pub async fn insert_interaction(db: &Database, rec: &NewInteraction) -> Result<i64, LeadgateError> {
    let rec = rec.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO interactions (lead_id, kind, notes, outcome, created_at)
                 VALUES (?1, ?2, ?3, ?4, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                params![rec.lead_id.0, rec.kind, rec.notes, rec.outcome],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List interactions for a lead, newest first.
pub async fn interactions_for_lead(
    db: &Database,
    lead_id: LeadId,
) -> Result<Vec<Interaction>, LeadgateError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, lead_id, kind, notes, outcome, created_at
                 FROM interactions WHERE lead_id = ?1 ORDER BY id DESC",
            )?;
            let rows = stmt.query_map(params![lead_id.0], read_interaction)?;
            let mut interactions = Vec::new();
            for row in rows {
                interactions.push(row?);
            }
            Ok(interactions)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
