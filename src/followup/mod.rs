//! Follow-up status report: one canonical status per family-planning client.
//!
//! For a reporting window, each in-scope plan is bucketed by how far its
//! scheduled check-in lies behind the window end (protected, lost to
//! follow-up, abandoned, or left unclassified), long-acting removals force
//! the plans they close to discontinued, and every client is reduced to the
//! plan whose visit is nearest the window end.
//!
//! Results are produced lazily, one client at a time, in client-code order.

mod classify;
mod reconcile;
mod scope;
mod types;

pub use classify::*;
pub use reconcile::*;
pub use scope::*;
pub use types::*;

use rusqlite::Connection;

use crate::config::ClassifierConfig;
use crate::db::{fetch_clients_with_history, ClientHistoryQuery, DatabaseError};
use crate::models::Client;

/// Lazily classified report rows. Single pass: once drained, it stays empty.
#[derive(Debug)]
pub struct StatusResults {
    clients: std::vec::IntoIter<Client>,
    query: StatusQuery,
    config: ClassifierConfig,
}

impl StatusResults {
    fn new(clients: Vec<Client>, query: StatusQuery, config: ClassifierConfig) -> Self {
        Self {
            clients: merge_by_code(clients).into_iter(),
            query,
            config,
        }
    }
}

impl Iterator for StatusResults {
    type Item = StatusResult;

    fn next(&mut self) -> Option<StatusResult> {
        for client in self.clients.by_ref() {
            if !is_retained(&client, &self.query.activity, &self.query.window, &self.config) {
                continue;
            }
            if let Some(result) = reconcile_client(&client, &self.query, &self.config) {
                return Some(result);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.clients.len()))
    }
}

/// A status report: a user-facing warning (if any) and the result rows.
#[derive(Debug)]
pub struct StatusReport {
    pub warning: Option<String>,
    pub results: StatusResults,
}

/// Sorts clients by code and folds duplicate codes into one client so each
/// code yields at most one result.
fn merge_by_code(mut clients: Vec<Client>) -> Vec<Client> {
    clients.sort_by(|a, b| a.code.cmp(&b.code));
    let mut merged: Vec<Client> = Vec::with_capacity(clients.len());
    for client in clients {
        match merged.last_mut() {
            Some(last) if last.code == client.code => last.visits.extend(client.visits),
            _ => merged.push(client),
        }
    }
    for client in merged.iter_mut() {
        client.visits.sort_by_key(|v| v.date);
    }
    merged
}

fn no_clinic_report(query: &StatusQuery, config: &ClassifierConfig) -> StatusReport {
    tracing::warn!("Status report requested without any clinic");
    StatusReport {
        warning: Some(NO_CLINIC_SELECTED.to_string()),
        results: StatusResults::new(Vec::new(), query.clone(), *config),
    }
}

/// Classifies already-loaded clients. Clients outside the selected clinics
/// are ignored.
pub fn classify_clients(
    clients: Vec<Client>,
    query: &StatusQuery,
    config: &ClassifierConfig,
) -> StatusReport {
    if query.clinic_ids.is_empty() {
        return no_clinic_report(query, config);
    }
    let selected: Vec<Client> = clients
        .into_iter()
        .filter(|c| query.clinic_ids.iter().any(|id| *id == c.clinic_id))
        .collect();
    StatusReport {
        warning: None,
        results: StatusResults::new(selected, query.clone(), *config),
    }
}

/// Loads the selected clinics' clients and classifies them.
pub fn fetch_client_statuses(
    conn: &Connection,
    query: &StatusQuery,
    config: &ClassifierConfig,
) -> Result<StatusReport, DatabaseError> {
    if query.clinic_ids.is_empty() {
        return Ok(no_clinic_report(query, config));
    }

    let history_query = ClientHistoryQuery {
        clinic_ids: query.clinic_ids.clone(),
        scheduled_from: query.window.start_minus_days(config.lookback_days),
        scheduled_to: query.window.end,
        removal_from: query.window.start,
        removal_to: query.window.end,
    };
    let clients = fetch_clients_with_history(conn, &history_query)?;
    tracing::debug!(
        clinics = query.clinic_ids.len(),
        candidates = clients.len(),
        "Loaded clients for status report"
    );

    Ok(classify_clients(clients, query, config))
}

// ── Tests ──────────────────────────────────────────────────────────────────
