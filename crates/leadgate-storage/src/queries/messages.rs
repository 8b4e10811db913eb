// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transcript message operations. Append-only: rows are never updated or
//! deleted once written.

use leadgate_core::LeadgateError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{LeadId, LeadMessage, NewMessage};
use crate::queries::parse_column;

fn read_message(row: &rusqlite::Row<'_>) -> Result<LeadMessage, rusqlite::Error> {
    let direction_raw: String = row.get(3)?;
    Ok(LeadMessage {
        id: row.get(0)?,
        lead_id: LeadId(row.get(1)?),
        content: row.get(2)?,
        direction: parse_column(3, &direction_raw)?,
        created_at: row.get(4)?,
    })
}

/// Append a transcript message for a lead. Returns the new row id.
pub async fn insert_message(db: &Database, message: &NewMessage) -> Result<i64, LeadgateError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (lead_id, content, direction, created_at)
                 VALUES (?1, ?2, ?3, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                params![
                    message.lead_id.0,
                    message.content,
                    message.direction.to_string(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get messages for a lead in insertion order, optionally limited to the
/// most recent `limit` rows.
pub async fn messages_for_lead(
    db: &Database,
    lead_id: LeadId,
    limit: Option<i64>,
) -> Result<Vec<LeadMessage>, LeadgateError> {
    db.connection()
        .call(move |conn| {
            let mut messages = Vec::new();
            match limit {
                Some(n) => {
                    // Fetch the newest n, then flip back to chronological order.
                    let mut stmt = conn.prepare(
                        "SELECT id, lead_id, content, direction, created_at
                         FROM (SELECT * FROM messages WHERE lead_id = ?1
                               ORDER BY id DESC LIMIT ?2)
                         ORDER BY id ASC",
                    )?;
                    let rows = stmt.query_map(params![lead_id.0, n], read_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT id, lead_id, content, direction, created_at
                         FROM messages WHERE lead_id = ?1 ORDER BY id ASC",
                    )?;
                    let rows = stmt.query_map(params![lead_id.0], read_message)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
