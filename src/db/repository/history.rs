use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::ToSql;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::*;

use super::{parse_stored_date, parse_uuid, sql_placeholders, MAX_IN_PARAMS};

/// Clients of the given clinics having at least one family-planning plan
/// scheduled within `[scheduled_from, scheduled_to]`, or a long-acting
/// removal recorded within `[removal_from, removal_to]` after an insertion
/// of the same method.
#[derive(Debug, Clone)]
pub struct ClientHistoryQuery {
    pub clinic_ids: Vec<String>,
    pub scheduled_from: NaiveDate,
    pub scheduled_to: NaiveDate,
    pub removal_from: NaiveDate,
    pub removal_to: NaiveDate,
}

/// Fetches matching clients with their complete visit and plan history
/// nested (visits oldest first). The date range only selects clients; the
/// nested history is not truncated.
pub fn fetch_clients_with_history(
    conn: &Connection,
    query: &ClientHistoryQuery,
) -> Result<Vec<Client>, DatabaseError> {
    if query.clinic_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut clients = fetch_matching_clients(conn, query)?;
    if clients.is_empty() {
        return Ok(clients);
    }

    let client_ids: Vec<String> = clients.iter().map(|c| c.id.to_string()).collect();
    let mut plans_by_visit = fetch_plans_for_clients(conn, &client_ids)?;
    let mut visits_by_client = fetch_visits_for_clients(conn, &client_ids)?;

    for visits in visits_by_client.values_mut() {
        for visit in visits.iter_mut() {
            visit.plans = plans_by_visit.remove(&visit.id).unwrap_or_default();
        }
    }
    for client in clients.iter_mut() {
        client.visits = visits_by_client.remove(&client.id).unwrap_or_default();
    }

    Ok(clients)
}

fn fetch_matching_clients(
    conn: &Connection,
    query: &ClientHistoryQuery,
) -> Result<Vec<Client>, DatabaseError> {
    let mut clients = Vec::new();

    for clinic_chunk in query.clinic_ids.chunks(MAX_IN_PARAMS) {
        let sql = format!(
            "SELECT c.id, c.code, c.name, c.birth_date, c.sex, c.clinic_id
             FROM clients c
             WHERE c.clinic_id IN ({})
               AND (
                   EXISTS (
                       SELECT 1 FROM planning_plans p
                       WHERE p.client_id = c.id
                         AND p.rdv_date IS NOT NULL
                         AND p.rdv_date >= ?1 AND p.rdv_date <= ?2
                   )
                   OR EXISTS (
                       SELECT 1 FROM planning_plans rp
                       JOIN visits rv ON rv.id = rp.visit_id
                       WHERE rp.client_id = c.id
                         AND rp.removal IS NOT NULL
                         AND rv.visit_date >= ?3 AND rv.visit_date <= ?4
                         AND EXISTS (
                             SELECT 1 FROM planning_plans ip
                             JOIN visits iv ON iv.id = ip.visit_id
                             WHERE ip.client_id = c.id
                               AND ip.method_dispensed = 1
                               AND ip.method = rp.removal
                               AND iv.visit_date < rv.visit_date
                         )
                   )
               )
             ORDER BY c.code",
            sql_placeholders(5, clinic_chunk.len())
        );

        let from = query.scheduled_from.to_string();
        let to = query.scheduled_to.to_string();
        let removal_from = query.removal_from.to_string();
        let removal_to = query.removal_to.to_string();
        let mut params: Vec<&dyn ToSql> = vec![
            &from as &dyn ToSql,
            &to as &dyn ToSql,
            &removal_from as &dyn ToSql,
            &removal_to as &dyn ToSql,
        ];
        params.extend(clinic_chunk.iter().map(|id| id as &dyn ToSql));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        for row in rows {
            let (id, code, name, birth_date, sex, clinic_id) = row?;
            clients.push(Client {
                id: parse_uuid(&id)?,
                code,
                name,
                birth_date: parse_stored_date(birth_date.as_deref(), "birth_date"),
                sex: Sex::from_str(&sex)?,
                clinic_id,
                visits: Vec::new(),
            });
        }
    }

    clients.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(clients)
}

fn fetch_visits_for_clients(
    conn: &Connection,
    client_ids: &[String],
) -> Result<HashMap<Uuid, Vec<VisitRecord>>, DatabaseError> {
    let mut by_client: HashMap<Uuid, Vec<VisitRecord>> = HashMap::new();

    for chunk in client_ids.chunks(MAX_IN_PARAMS) {
        let sql = format!(
            "SELECT id, client_id, visit_date, activity
             FROM visits
             WHERE client_id IN ({})
             ORDER BY visit_date ASC, rowid ASC",
            sql_placeholders(1, chunk.len())
        );
        let params: Vec<&dyn ToSql> = chunk.iter().map(|id| id as &dyn ToSql).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        for row in rows {
            let (id, client_id, visit_date, activity) = row?;
            let Some(date) = parse_stored_date(Some(&visit_date), "visit_date") else {
                continue;
            };
            let client_id = parse_uuid(&client_id)?;
            by_client.entry(client_id).or_default().push(VisitRecord {
                id: parse_uuid(&id)?,
                client_id,
                date,
                activity,
                plans: Vec::new(),
            });
        }
    }

    Ok(by_client)
}

fn fetch_plans_for_clients(
    conn: &Connection,
    client_ids: &[String],
) -> Result<HashMap<Uuid, Vec<FollowUpPlan>>, DatabaseError> {
    let mut by_visit: HashMap<Uuid, Vec<FollowUpPlan>> = HashMap::new();

    for chunk in client_ids.chunks(MAX_IN_PARAMS) {
        let sql = format!(
            "SELECT id, visit_id, method_dispensed, method, rdv_date, removal
             FROM planning_plans
             WHERE client_id IN ({})
             ORDER BY rowid ASC",
            sql_placeholders(1, chunk.len())
        );
        let params: Vec<&dyn ToSql> = chunk.iter().map(|id| id as &dyn ToSql).collect();

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        for row in rows {
            let (id, visit_id, dispensed, method, rdv_date, removal) = row?;
            let visit_id = parse_uuid(&visit_id)?;
            by_visit.entry(visit_id).or_default().push(FollowUpPlan {
                id: parse_uuid(&id)?,
                visit_id,
                method_dispensed: dispensed != 0,
                method: method.map(|m| ContraceptiveMethod::from_str(&m)).transpose()?,
                scheduled_date: parse_stored_date(rdv_date.as_deref(), "rdv_date"),
                removal: removal.map(|r| LongActingMethod::from_str(&r)).transpose()?,
            });
        }
    }

    Ok(by_visit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::{insert_client, insert_clinic, insert_plan, insert_visit};
    use rusqlite::params;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed_clinic(conn: &Connection, id: &str) {
        insert_clinic(conn, &Clinic { id: id.into(), name: format!("Clinic {id}") }).unwrap();
    }

    fn seed_client(conn: &Connection, code: &str, clinic: &str) -> Uuid {
        let id = Uuid::new_v4();
        insert_client(conn, &Client {
            id,
            code: code.into(),
            name: format!("Client {code}"),
            birth_date: Some(date(1995, 6, 1)),
            sex: Sex::Female,
            clinic_id: clinic.into(),
            visits: Vec::new(),
        })
        .unwrap();
        id
    }

    fn seed_visit(conn: &Connection, client: Uuid, on: NaiveDate, activity: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        insert_visit(conn, &VisitRecord {
            id,
            client_id: client,
            date: on,
            activity: activity.map(String::from),
            plans: Vec::new(),
        })
        .unwrap();
        id
    }

    fn seed_plan(conn: &Connection, visit: Uuid, rdv: Option<NaiveDate>) -> Uuid {
        let id = Uuid::new_v4();
        insert_plan(conn, &FollowUpPlan {
            id,
            visit_id: visit,
            method_dispensed: true,
            method: Some(ContraceptiveMethod::Injectable),
            scheduled_date: rdv,
            removal: None,
        })
        .unwrap();
        id
    }

    fn query(clinics: &[&str]) -> ClientHistoryQuery {
        ClientHistoryQuery {
            clinic_ids: clinics.iter().map(|c| c.to_string()).collect(),
            scheduled_from: date(2024, 10, 1),
            scheduled_to: date(2025, 1, 31),
            removal_from: date(2025, 1, 1),
            removal_to: date(2025, 1, 31),
        }
    }

    fn seed_long_acting(
        conn: &Connection,
        visit: Uuid,
        inserted: Option<LongActingMethod>,
        removed: Option<LongActingMethod>,
        rdv: Option<NaiveDate>,
    ) {
        insert_plan(conn, &FollowUpPlan {
            id: Uuid::new_v4(),
            visit_id: visit,
            method_dispensed: inserted.is_some(),
            method: inserted.map(|m| match m {
                LongActingMethod::Implant => ContraceptiveMethod::Implant,
                LongActingMethod::Iud => ContraceptiveMethod::Iud,
            }),
            scheduled_date: rdv,
            removal: removed,
        })
        .unwrap();
    }

    #[test]
    fn empty_clinic_list_returns_nothing() {
        let conn = open_memory_database().unwrap();
        let clients = fetch_clients_with_history(&conn, &query(&[])).unwrap();
        assert!(clients.is_empty());
    }

    #[test]
    fn nests_visits_and_plans() {
        let conn = open_memory_database().unwrap();
        seed_clinic(&conn, "c1");
        let client = seed_client(&conn, "CL-001", "c1");
        let v1 = seed_visit(&conn, client, date(2024, 11, 1), None);
        let v2 = seed_visit(&conn, client, date(2024, 12, 1), Some("outreach"));
        seed_plan(&conn, v1, Some(date(2024, 12, 1)));
        seed_plan(&conn, v2, Some(date(2025, 3, 1)));

        let clients = fetch_clients_with_history(&conn, &query(&["c1"])).unwrap();
        assert_eq!(clients.len(), 1);
        let fetched = &clients[0];
        assert_eq!(fetched.code, "CL-001");
        assert_eq!(fetched.visits.len(), 2);
        assert_eq!(fetched.visits[0].date, date(2024, 11, 1));
        assert_eq!(fetched.visits[1].activity.as_deref(), Some("outreach"));
        assert_eq!(fetched.visits[0].plans.len(), 1);
        assert_eq!(fetched.visits[1].plans[0].scheduled_date, Some(date(2025, 3, 1)));
    }

    #[test]
    fn excludes_other_clinics() {
        let conn = open_memory_database().unwrap();
        seed_clinic(&conn, "c1");
        seed_clinic(&conn, "c2");
        let a = seed_client(&conn, "A", "c1");
        let b = seed_client(&conn, "B", "c2");
        let va = seed_visit(&conn, a, date(2024, 12, 1), None);
        let vb = seed_visit(&conn, b, date(2024, 12, 1), None);
        seed_plan(&conn, va, Some(date(2025, 1, 10)));
        seed_plan(&conn, vb, Some(date(2025, 1, 10)));

        let clients = fetch_clients_with_history(&conn, &query(&["c2"])).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].code, "B");
    }

    #[test]
    fn excludes_clients_without_scheduled_date_in_range() {
        let conn = open_memory_database().unwrap();
        seed_clinic(&conn, "c1");
        let early = seed_client(&conn, "EARLY", "c1");
        let none = seed_client(&conn, "NONE", "c1");
        let ve = seed_visit(&conn, early, date(2024, 1, 1), None);
        let vn = seed_visit(&conn, none, date(2024, 12, 1), None);
        seed_plan(&conn, ve, Some(date(2024, 2, 1)));
        seed_plan(&conn, vn, None);

        let clients = fetch_clients_with_history(&conn, &query(&["c1"])).unwrap();
        assert!(clients.is_empty());
    }

    #[test]
    fn unreadable_rdv_date_reads_as_none() {
        let conn = open_memory_database().unwrap();
        seed_clinic(&conn, "c1");
        let client = seed_client(&conn, "CL-1", "c1");
        let visit = seed_visit(&conn, client, date(2024, 12, 1), None);
        seed_plan(&conn, visit, Some(date(2025, 1, 5)));
        let broken = seed_plan(&conn, visit, None);
        conn.execute(
            "UPDATE planning_plans SET rdv_date = '2025-13-45' WHERE id = ?1",
            params![broken.to_string()],
        )
        .unwrap();

        let clients = fetch_clients_with_history(&conn, &query(&["c1"])).unwrap();
        let plans = &clients[0].visits[0].plans;
        assert_eq!(plans.len(), 2);
        let broken_plan = plans.iter().find(|p| p.id == broken).unwrap();
        assert_eq!(broken_plan.scheduled_date, None);
    }

    #[test]
    fn clients_sorted_by_code_across_clinics() {
        let conn = open_memory_database().unwrap();
        seed_clinic(&conn, "c1");
        seed_clinic(&conn, "c2");
        for (code, clinic) in [("Z-9", "c1"), ("A-1", "c2"), ("M-5", "c1")] {
            let client = seed_client(&conn, code, clinic);
            let visit = seed_visit(&conn, client, date(2024, 12, 1), None);
            seed_plan(&conn, visit, Some(date(2025, 1, 1)));
        }

        let clients = fetch_clients_with_history(&conn, &query(&["c1", "c2"])).unwrap();
        let codes: Vec<_> = clients.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["A-1", "M-5", "Z-9"]);
    }

    #[test]
    fn includes_client_with_removal_in_window() {
        let conn = open_memory_database().unwrap();
        seed_clinic(&conn, "c1");
        let client = seed_client(&conn, "IMP-1", "c1");
        let inserted = seed_visit(&conn, client, date(2024, 6, 1), None);
        let removed = seed_visit(&conn, client, date(2025, 1, 20), None);
        seed_long_acting(&conn, inserted, Some(LongActingMethod::Implant), None, Some(date(2027, 6, 1)));
        seed_long_acting(&conn, removed, None, Some(LongActingMethod::Implant), None);

        let clients = fetch_clients_with_history(&conn, &query(&["c1"])).unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].visits.len(), 2);
    }

    #[test]
    fn excludes_removal_without_matching_insertion() {
        let conn = open_memory_database().unwrap();
        seed_clinic(&conn, "c1");
        let client = seed_client(&conn, "IUD-1", "c1");
        let inserted = seed_visit(&conn, client, date(2024, 6, 1), None);
        let removed = seed_visit(&conn, client, date(2025, 1, 20), None);
        seed_long_acting(&conn, inserted, Some(LongActingMethod::Implant), None, Some(date(2027, 6, 1)));
        seed_long_acting(&conn, removed, None, Some(LongActingMethod::Iud), None);

        let clients = fetch_clients_with_history(&conn, &query(&["c1"])).unwrap();
        assert!(clients.is_empty());
    }

    #[test]
    fn same_day_visits_and_plans_keep_recording_order() {
        let conn = open_memory_database().unwrap();
        seed_clinic(&conn, "c1");
        let client = seed_client(&conn, "CL-1", "c1");
        let first_visit = seed_visit(&conn, client, date(2024, 12, 1), None);
        let second_visit = seed_visit(&conn, client, date(2024, 12, 1), Some("outreach"));
        let plans: Vec<Uuid> = (1..=4)
            .map(|d| seed_plan(&conn, first_visit, Some(date(2025, 1, d))))
            .collect();
        seed_plan(&conn, second_visit, Some(date(2025, 1, 10)));

        let clients = fetch_clients_with_history(&conn, &query(&["c1"])).unwrap();
        let visits = &clients[0].visits;
        assert_eq!(visits[0].id, first_visit);
        assert_eq!(visits[1].id, second_visit);
        let fetched: Vec<Uuid> = visits[0].plans.iter().map(|p| p.id).collect();
        assert_eq!(fetched, plans);
    }
}
