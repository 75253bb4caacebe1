use std::collections::HashSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::config::ClassifierConfig;
use crate::dates::ReportWindow;
use crate::models::{Client, FollowUpPlan, FollowUpStatus};

/// Buckets a scheduled follow-up against the window end.
///
/// `diff = window_end - scheduled` in days. The gap between the lost and
/// abandoned ranges, and anything past the abandoned range, stays
/// `Unclassified`.
pub fn bucket_for(
    scheduled: NaiveDate,
    window_end: NaiveDate,
    config: &ClassifierConfig,
) -> FollowUpStatus {
    let diff = (window_end - scheduled).num_days();
    if diff <= 0 {
        FollowUpStatus::Protected
    } else if diff <= config.lost_max_days {
        FollowUpStatus::LostToFollowUp
    } else if diff >= config.abandoned_min_days && diff <= config.abandoned_max_days {
        FollowUpStatus::Abandoned
    } else {
        FollowUpStatus::Unclassified
    }
}

/// Plans closed by a long-acting removal.
///
/// A removal at visit date `r` within the window closes the most recent
/// insertion of the same method strictly before `r`. Both the removal plan
/// and that insertion plan are returned. A removal with no earlier
/// insertion on record closes nothing.
pub fn discontinued_plans(client: &Client, window: &ReportWindow) -> HashSet<Uuid> {
    let mut dated: Vec<(NaiveDate, &FollowUpPlan)> = client
        .visits
        .iter()
        .flat_map(|v| v.plans.iter().map(move |p| (v.date, p)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);

    let mut closed = HashSet::new();
    for (removed_on, removal_plan) in &dated {
        let Some(method) = removal_plan.removal else {
            continue;
        };
        if !window.contains(*removed_on) {
            continue;
        }
        let insertion = dated
            .iter()
            .filter(|(inserted_on, p)| {
                inserted_on < removed_on && p.inserted_long_acting() == Some(method)
            })
            .last();
        if let Some((_, inserted)) = insertion {
            closed.insert(removal_plan.id);
            closed.insert(inserted.id);
        }
    }
    closed
}

/// Status of a single plan, or `None` when the plan cannot be classified
/// (no scheduled date and not closed by a removal).
pub fn classify_plan(
    plan: &FollowUpPlan,
    discontinued: bool,
    window: &ReportWindow,
    config: &ClassifierConfig,
) -> Option<FollowUpStatus> {
    if discontinued {
        return Some(FollowUpStatus::Discontinued);
    }
    plan.scheduled_date
        .map(|scheduled| bucket_for(scheduled, window.end, config))
}
