use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_clinic(conn: &Connection, clinic: &Clinic) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinics (id, name) VALUES (?1, ?2)",
        params![clinic.id, clinic.name],
    )?;
    Ok(())
}

/// Inserts the client row only; nested visits are inserted separately.
pub fn insert_client(conn: &Connection, client: &Client) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clients (id, code, name, birth_date, sex, clinic_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            client.id.to_string(),
            client.code,
            client.name,
            client.birth_date.map(|d| d.to_string()),
            client.sex.as_str(),
            client.clinic_id,
        ],
    )?;
    Ok(())
}

pub fn insert_visit(conn: &Connection, visit: &VisitRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO visits (id, client_id, visit_date, activity)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            visit.id.to_string(),
            visit.client_id.to_string(),
            visit.date.to_string(),
            visit.activity,
        ],
    )?;
    Ok(())
}

/// Inserts a family-planning plan. The owning client is taken from the visit.
pub fn insert_plan(conn: &Connection, plan: &FollowUpPlan) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "INSERT INTO planning_plans (id, visit_id, client_id, method_dispensed, method, rdv_date, removal)
         SELECT ?1, v.id, v.client_id, ?3, ?4, ?5, ?6 FROM visits v WHERE v.id = ?2",
        params![
            plan.id.to_string(),
            plan.visit_id.to_string(),
            plan.method_dispensed as i32,
            plan.method.map(|m| m.as_str()),
            plan.scheduled_date.map(|d| d.to_string()),
            plan.removal.map(|r| r.as_str()),
        ],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Visit".into(),
            id: plan.visit_id.to_string(),
        });
    }
    Ok(())
}

/// Inserts a client with every nested visit and plan in one transaction.
pub fn insert_client_with_history(
    conn: &mut Connection,
    client: &Client,
) -> Result<(), DatabaseError> {
    let tx = conn.transaction()?;
    insert_client(&tx, client)?;
    for visit in &client.visits {
        insert_visit(&tx, visit)?;
        for plan in &visit.plans {
            insert_plan(&tx, plan)?;
        }
    }
    tx.commit()?;
    Ok(())
}
