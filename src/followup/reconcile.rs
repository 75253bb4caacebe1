use chrono::NaiveDate;

use crate::config::ClassifierConfig;
use crate::models::{Client, FollowUpPlan, FollowUpStatus};

use super::classify::{classify_plan, discontinued_plans};
use super::scope::scoped_plans;
use super::types::{StatusFlags, StatusQuery, StatusResult};

#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    visit_date: NaiveDate,
    plan: &'a FollowUpPlan,
    status: FollowUpStatus,
}

/// Whether `challenger` should replace `current` as the client's canonical
/// plan: nearer to the window end wins, the later visit wins a distance tie,
/// and on the same visit day a discontinuation wins.
///
/// Candidates never lie after `end`, so the gap is never negative.
fn supersedes(challenger: &Candidate<'_>, current: &Candidate<'_>, end: NaiveDate) -> bool {
    let challenger_gap = (end - challenger.visit_date).num_days();
    let current_gap = (end - current.visit_date).num_days();
    if challenger_gap != current_gap {
        return challenger_gap < current_gap;
    }
    if challenger.visit_date != current.visit_date {
        return challenger.visit_date > current.visit_date;
    }
    challenger.status == FollowUpStatus::Discontinued
        && current.status != FollowUpStatus::Discontinued
}

/// Reduces all of a client's qualifying plans to one `StatusResult`.
///
/// Qualifying plans are in scope for the activity filter, recorded on or
/// before the window end, and either closed by a long-acting removal or
/// scheduled no earlier than the lookback start.
pub fn reconcile_client(
    client: &Client,
    query: &StatusQuery,
    config: &ClassifierConfig,
) -> Option<StatusResult> {
    let window = &query.window;
    let closed = discontinued_plans(client, window);
    let lookback_start = window.start_minus_days(config.lookback_days);

    let best = scoped_plans(client, &query.activity)
        .filter(|(visit_date, _)| *visit_date <= window.end)
        .filter_map(|(visit_date, plan)| {
            let discontinued = closed.contains(&plan.id);
            if !discontinued && plan.scheduled_date.is_some_and(|d| d < lookback_start) {
                return None;
            }
            let status = classify_plan(plan, discontinued, window, config)?;
            Some(Candidate {
                visit_date,
                plan,
                status,
            })
        })
        .fold(None::<Candidate<'_>>, |best, candidate| match best {
            Some(current) if !supersedes(&candidate, &current, window.end) => Some(current),
            _ => Some(candidate),
        })?;

    Some(StatusResult {
        client_code: client.code.clone(),
        client_name: client.name.clone(),
        clinic_id: client.clinic_id.clone(),
        visit_date: best.visit_date,
        scheduled_date: best.plan.scheduled_date,
        method: best.plan.method,
        status: best.status,
        flags: StatusFlags::from(best.status),
    })
}
