// SPDX-FileCopyrightText: 2026 Leadgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Visitor attribution log (page hits with UTM parameters).

use leadgate_core::LeadgateError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{NewVisit, Visit};

fn read_visit(row: &rusqlite::Row<'_>) -> Result<Visit, rusqlite::Error> {
    Ok(Visit {
        id: row.get(0)?,
        ip_address: row.get(1)?,
        country: row.get(2)?,
        city: row.get(3)?,
        user_agent: row.get(4)?,
        referrer: row.get(5)?,
        path: row.get(6)?,
        utm_source: row.get(7)?,
        utm_medium: row.get(8)?,
        utm_campaign: row.get(9)?,
        utm_term: row.get(10)?,
        utm_content: row.get(11)?,
        created_at: row.get(12)?,
    })
}

/// Append a visit row. Returns the new row id.
pub async fn record_visit(db: &Database, visit: &NewVisit) -> Result<i64, LeadgateError> {
    let visit = visit.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO visitor_log (ip_address, country, city, user_agent, referrer, path,
                                          utm_source, utm_medium, utm_campaign, utm_term,
                                          utm_content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                         strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
                params![
                    visit.ip_address,
                    visit.country,
                    visit.city,
                    visit.user_agent,
                    visit.referrer,
                    visit.path,
                    visit.utm_source,
                    visit.utm_medium,
                    visit.utm_campaign,
                    visit.utm_term,
                    visit.utm_content,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The most recent `limit` visits, newest first.
pub async fn recent_visits(db: &Database, limit: i64) -> Result<Vec<Visit>, LeadgateError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, ip_address, country, city, user_agent, referrer, path,
                        utm_source, utm_medium, utm_campaign, utm_term, utm_content, created_at
                 FROM visitor_log ORDER BY id DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], read_visit)?;
            let mut visits = Vec::new();
            for row in rows {
                visits.push(row?);
            }
            Ok(visits)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
