use chrono::NaiveDate;

use crate::config::ClassifierConfig;
use crate::dates::ReportWindow;
use crate::models::{Client, FollowUpPlan};

use super::classify::discontinued_plans;
use super::types::ActivityFilter;

/// In-scope plans of a client with their visit dates: plans recorded at a
/// visit matching the activity filter.
pub fn scoped_plans<'a>(
    client: &'a Client,
    activity: &'a ActivityFilter,
) -> impl Iterator<Item = (NaiveDate, &'a FollowUpPlan)> + 'a {
    client
        .visits
        .iter()
        .filter(move |v| activity.matches(v.activity.as_deref()))
        .flat_map(|v| v.plans.iter().map(move |p| (v.date, p)))
}

/// A client enters the report when at least one in-scope plan is scheduled
/// within `[start - lookback, end]`, or is closed by a long-acting removal
/// inside the window.
pub fn is_retained(
    client: &Client,
    activity: &ActivityFilter,
    window: &ReportWindow,
    config: &ClassifierConfig,
) -> bool {
    let from = window.start_minus_days(config.lookback_days);
    let scheduled_in_range = scoped_plans(client, activity).any(|(_, plan)| {
        plan.scheduled_date
            .is_some_and(|d| d >= from && d <= window.end)
    });
    if scheduled_in_range {
        return true;
    }

    let closed = discontinued_plans(client, window);
    !closed.is_empty() && scoped_plans(client, activity).any(|(_, plan)| closed.contains(&plan.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sex, VisitRecord};
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn client(visits: &[(NaiveDate, Option<&str>, Option<NaiveDate>)]) -> Client {
        let id = Uuid::new_v4();
        Client {
            id,
            code: "CL".into(),
            name: "Client".into(),
            birth_date: None,
            sex: Sex::Female,
            clinic_id: "c1".into(),
            visits: visits
                .iter()
                .map(|(on, activity, rdv)| {
                    let visit_id = Uuid::new_v4();
                    VisitRecord {
                        id: visit_id,
                        client_id: id,
                        date: *on,
                        activity: activity.map(String::from),
                        plans: vec![FollowUpPlan {
                            id: Uuid::new_v4(),
                            visit_id,
                            method_dispensed: true,
                            method: None,
                            scheduled_date: *rdv,
                            removal: None,
                        }],
                    }
                })
                .collect(),
        }
    }

    fn window() -> ReportWindow {
        ReportWindow::new(date(2025, 1, 1), date(2025, 1, 31)).unwrap()
    }

    #[test]
    fn untagged_filter_ignores_activity_visits() {
        let c = client(&[(date(2024, 12, 1), Some("outreach"), Some(date(2025, 1, 10)))]);
        assert!(!is_retained(&c, &ActivityFilter::Untagged, &window(), &ClassifierConfig::default()));
    }

    #[test]
    fn tag_filter_selects_matching_visits() {
        let c = client(&[(date(2024, 12, 1), Some("outreach"), Some(date(2025, 1, 10)))]);
        let filter = ActivityFilter::Tags(vec!["market".into(), "outreach".into()]);
        assert!(is_retained(&c, &filter, &window(), &ClassifierConfig::default()));
        let other = ActivityFilter::Tags(vec!["school".into()]);
        assert!(!is_retained(&c, &other, &window(), &ClassifierConfig::default()));
    }

    #[test]
    fn lookback_bounds_are_inclusive() {
        let config = ClassifierConfig::default();
        // 2025-01-01 minus 90 days
        let edge = client(&[(date(2024, 9, 1), None, Some(date(2024, 10, 3)))]);
        assert!(is_retained(&edge, &ActivityFilter::Untagged, &window(), &config));
        let before = client(&[(date(2024, 9, 1), None, Some(date(2024, 10, 2)))]);
        assert!(!is_retained(&before, &ActivityFilter::Untagged, &window(), &config));
        let at_end = client(&[(date(2025, 1, 5), None, Some(date(2025, 1, 31)))]);
        assert!(is_retained(&at_end, &ActivityFilter::Untagged, &window(), &config));
        let after = client(&[(date(2025, 1, 5), None, Some(date(2025, 2, 1)))]);
        assert!(!is_retained(&after, &ActivityFilter::Untagged, &window(), &config));
    }

    #[test]
    fn plan_without_schedule_never_retains() {
        let c = client(&[(date(2025, 1, 5), None, None)]);
        assert!(!is_retained(&c, &ActivityFilter::Untagged, &window(), &ClassifierConfig::default()));
    }

    #[test]
    fn removal_in_window_retains_without_nearby_schedule() {
        let mut c = client(&[
            (date(2024, 6, 1), None, Some(date(2027, 6, 1))),
            (date(2025, 1, 20), None, None),
        ]);
        c.visits[0].plans[0].method = Some(crate::models::ContraceptiveMethod::Implant);
        c.visits[1].plans[0].method_dispensed = false;
        c.visits[1].plans[0].removal = Some(crate::models::LongActingMethod::Implant);
        assert!(is_retained(&c, &ActivityFilter::Untagged, &window(), &ClassifierConfig::default()));

        // The same removal outside the window does not.
        let later = ReportWindow::new(date(2025, 3, 1), date(2025, 3, 31)).unwrap();
        assert!(!is_retained(&c, &ActivityFilter::Untagged, &later, &ClassifierConfig::default()));
    }

    #[test]
    fn removal_without_prior_insertion_does_not_retain() {
        let mut c = client(&[(date(2025, 1, 20), None, None)]);
        c.visits[0].plans[0].method_dispensed = false;
        c.visits[0].plans[0].removal = Some(crate::models::LongActingMethod::Iud);
        assert!(!is_retained(&c, &ActivityFilter::Untagged, &window(), &ClassifierConfig::default()));
    }

    #[test]
    fn empty_tag_list_means_untagged() {
        assert_eq!(ActivityFilter::from_tags(Some(vec![])), ActivityFilter::Untagged);
        assert_eq!(ActivityFilter::from_tags(None), ActivityFilter::Untagged);
        assert_eq!(ActivityFilter::default(), ActivityFilter::Untagged);
    }
}
