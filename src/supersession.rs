//! Superseding-visit lookup for appointment reports.
//!
//! Given a client's scheduled date in one clinical domain, the superseding
//! visit is the visit at which the next later date of that domain was set:
//! the client came back and was rescheduled. The same lookup serves family
//! planning, obstetric and HIV-care records; the domain only selects the
//! table.

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{parse_stored_date, parse_uuid, sql_placeholders, DatabaseError, MAX_IN_PARAMS};
use crate::models::ClinicalDomain;

/// A scheduled date and the visit it was recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledVisit {
    pub client_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub visit_date: NaiveDate,
}

/// Per-client scheduled dates of one domain, sorted for lookup.
#[derive(Debug, Default)]
pub struct SupersessionIndex {
    by_client: HashMap<Uuid, Vec<(NaiveDate, NaiveDate)>>,
}

impl SupersessionIndex {
    pub fn from_records(records: impl IntoIterator<Item = ScheduledVisit>) -> Self {
        let mut by_client: HashMap<Uuid, Vec<(NaiveDate, NaiveDate)>> = HashMap::new();
        for record in records {
            by_client
                .entry(record.client_id)
                .or_default()
                .push((record.scheduled_date, record.visit_date));
        }
        for dates in by_client.values_mut() {
            dates.sort();
        }
        Self { by_client }
    }

    /// Loads every scheduled date of `domain` for the given clients.
    /// One query per `MAX_IN_PARAMS` clients.
    pub fn load(
        conn: &Connection,
        domain: ClinicalDomain,
        client_ids: &[Uuid],
    ) -> Result<Self, DatabaseError> {
        let mut records = Vec::new();
        let ids: Vec<String> = client_ids.iter().map(Uuid::to_string).collect();

        for chunk in ids.chunks(MAX_IN_PARAMS) {
            let sql = format!(
                "SELECT r.client_id, r.{col}, v.visit_date
                 FROM {table} r
                 JOIN visits v ON v.id = r.visit_id
                 WHERE r.{col} IS NOT NULL AND r.client_id IN ({ids})",
                col = domain.scheduled_column(),
                table = domain.table(),
                ids = sql_placeholders(1, chunk.len()),
            );
            let params: Vec<&dyn ToSql> = chunk.iter().map(|id| id as &dyn ToSql).collect();

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params.as_slice(), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?;

            for row in rows {
                let (client_id, scheduled, visit) = row?;
                let (Some(scheduled_date), Some(visit_date)) = (
                    parse_stored_date(Some(&scheduled), domain.scheduled_column()),
                    parse_stored_date(Some(&visit), "visit_date"),
                ) else {
                    continue;
                };
                records.push(ScheduledVisit {
                    client_id: parse_uuid(&client_id)?,
                    scheduled_date,
                    visit_date,
                });
            }
        }

        tracing::debug!(
            domain = domain.as_str(),
            clients = client_ids.len(),
            records = records.len(),
            "Loaded supersession index"
        );
        Ok(Self::from_records(records))
    }

    /// Visit date of the earliest scheduled date strictly after `after`.
    pub fn superseding_visit(&self, client_id: &Uuid, after: NaiveDate) -> Option<NaiveDate> {
        let dates = self.by_client.get(client_id)?;
        let next = dates.partition_point(|(scheduled, _)| *scheduled <= after);
        dates.get(next).map(|(_, visit)| *visit)
    }
}
