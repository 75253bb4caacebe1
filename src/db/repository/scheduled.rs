use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

impl ClinicalDomain {
    /// Table holding this domain's records. Every domain table carries
    /// `id`, `visit_id`, `client_id` and `rdv_date`.
    pub fn table(&self) -> &'static str {
        match self {
            Self::FamilyPlanning => "planning_plans",
            Self::Obstetric => "obstetric_records",
            Self::HivCare => "hiv_care_records",
        }
    }

    /// Column holding the next scheduled date.
    pub fn scheduled_column(&self) -> &'static str {
        "rdv_date"
    }
}

/// Inserts a bare scheduled record into its domain table.
/// The owning client is taken from the visit.
pub fn insert_scheduled_record(
    conn: &Connection,
    record: &ScheduledRecord,
) -> Result<(), DatabaseError> {
    let sql = format!(
        "INSERT INTO {table} (id, visit_id, client_id, {col})
         SELECT ?1, v.id, v.client_id, ?3 FROM visits v WHERE v.id = ?2",
        table = record.domain.table(),
        col = record.domain.scheduled_column(),
    );
    let changed = conn.execute(
        &sql,
        params![
            record.id.to_string(),
            record.visit_id.to_string(),
            record.scheduled_date.map(|d| d.to_string()),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Visit".into(),
            id: record.visit_id.to_string(),
        });
    }
    Ok(())
}
