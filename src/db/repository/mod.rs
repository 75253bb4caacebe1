//! Repository layer: entity-scoped database operations.
//!
//! Insert helpers seed clinics, clients, visits and follow-up records.
//! `fetch_clients_with_history` is the report read path: it returns clients
//! with visits and family-planning plans nested, in three batched queries.

mod client;
mod history;
mod scheduled;

use chrono::NaiveDate;
use uuid::Uuid;

use super::DatabaseError;

pub use client::*;
pub use history::*;
pub use scheduled::*;

/// Upper bound on bound parameters per `IN (...)` list.
pub(crate) const MAX_IN_PARAMS: usize = 500;

/// `?{start}, ?{start+1}, ...` for `count` parameters.
pub(crate) fn sql_placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn parse_uuid(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

/// Stored dates are ISO `YYYY-MM-DD`. Anything else reads as absent.
pub(crate) fn parse_stored_date(raw: Option<&str>, column: &str) -> Option<NaiveDate> {
    let raw = raw?;
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::debug!(column, value = raw, "Skipping unreadable stored date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_from_start() {
        assert_eq!(sql_placeholders(1, 3), "?1, ?2, ?3");
        assert_eq!(sql_placeholders(4, 1), "?4");
        assert_eq!(sql_placeholders(1, 0), "");
    }

    #[test]
    fn stored_date_parses_iso_only() {
        assert_eq!(
            parse_stored_date(Some("2025-01-15"), "rdv_date"),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(parse_stored_date(Some("15/01/2025"), "rdv_date"), None);
        assert_eq!(parse_stored_date(Some("2025-02-30"), "rdv_date"), None);
        assert_eq!(parse_stored_date(None, "rdv_date"), None);
    }

    #[test]
    fn invalid_uuid_is_constraint_violation() {
        let err = parse_uuid("not-a-uuid").unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }
}
