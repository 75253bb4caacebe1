//! Appointment (RDV) report: scheduled check-ins falling inside a window.
//!
//! One row per domain record whose scheduled date lies in the window, for
//! clients of the selected clinics. Each row carries the superseding visit,
//! if the client was seen again and rescheduled.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::ReportWindow;
use crate::db::{parse_stored_date, parse_uuid, sql_placeholders, DatabaseError, MAX_IN_PARAMS};
use crate::followup::NO_CLINIC_SELECTED;
use crate::models::ClinicalDomain;
use crate::supersession::SupersessionIndex;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdvQuery {
    pub clinic_ids: Vec<String>,
    pub window: ReportWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdvRow {
    pub client_code: String,
    pub client_name: String,
    pub clinic_id: String,
    /// Visit at which the appointment was set.
    pub visit_date: NaiveDate,
    pub scheduled_date: NaiveDate,
    pub superseding_visit: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RdvReport {
    pub warning: Option<String>,
    pub rows: Vec<RdvRow>,
}

/// Builds the appointment report of one domain, ordered by scheduled date
/// then client code.
pub fn fetch_rdv_report(
    conn: &Connection,
    domain: ClinicalDomain,
    query: &RdvQuery,
) -> Result<RdvReport, DatabaseError> {
    if query.clinic_ids.is_empty() {
        tracing::warn!(domain = domain.as_str(), "RDV report requested without any clinic");
        return Ok(RdvReport {
            warning: Some(NO_CLINIC_SELECTED.to_string()),
            rows: Vec::new(),
        });
    }

    let mut pending: Vec<(Uuid, RdvRow)> = Vec::new();
    let from = query.window.start.to_string();
    let to = query.window.end.to_string();

    for clinic_chunk in query.clinic_ids.chunks(MAX_IN_PARAMS) {
        let sql = format!(
            "SELECT c.id, c.code, c.name, c.clinic_id, v.visit_date, r.{col}
             FROM {table} r
             JOIN visits v ON v.id = r.visit_id
             JOIN clients c ON c.id = r.client_id
             WHERE r.{col} IS NOT NULL
               AND r.{col} >= ?1 AND r.{col} <= ?2
               AND c.clinic_id IN ({clinics})",
            col = domain.scheduled_column(),
            table = domain.table(),
            clinics = sql_placeholders(3, clinic_chunk.len()),
        );
        let mut params: Vec<&dyn ToSql> = vec![&from as &dyn ToSql, &to as &dyn ToSql];
        params.extend(clinic_chunk.iter().map(|id| id as &dyn ToSql));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        for row in rows {
            let (client_id, code, name, clinic_id, visit, scheduled) = row?;
            let (Some(visit_date), Some(scheduled_date)) = (
                parse_stored_date(Some(&visit), "visit_date"),
                parse_stored_date(Some(&scheduled), domain.scheduled_column()),
            ) else {
                continue;
            };
            pending.push((
                parse_uuid(&client_id)?,
                RdvRow {
                    client_code: code,
                    client_name: name,
                    clinic_id,
                    visit_date,
                    scheduled_date,
                    superseding_visit: None,
                },
            ));
        }
    }

    let client_ids: Vec<Uuid> = pending
        .iter()
        .map(|(id, _)| *id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let index = SupersessionIndex::load(conn, domain, &client_ids)?;

    let mut rows: Vec<RdvRow> = pending
        .into_iter()
        .map(|(client_id, mut row)| {
            row.superseding_visit = index.superseding_visit(&client_id, row.scheduled_date);
            row
        })
        .collect();
    rows.sort_by(|a, b| {
        a.scheduled_date
            .cmp(&b.scheduled_date)
            .then_with(|| a.client_code.cmp(&b.client_code))
    });

    tracing::debug!(domain = domain.as_str(), rows = rows.len(), "Built RDV report");
    Ok(RdvReport { warning: None, rows })
}
