use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::ReportWindow;
use crate::models::{ContraceptiveMethod, FollowUpStatus};

/// Shown to the user when a report is requested without any clinic.
pub const NO_CLINIC_SELECTED: &str = "Select at least one clinic to build the report";

/// Which visits count toward a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tags", rename_all = "snake_case")]
pub enum ActivityFilter {
    /// Routine visits only: the visit carries no activity tag.
    #[default]
    Untagged,
    /// Visits recorded under one of these activities.
    Tags(Vec<String>),
}

impl ActivityFilter {
    /// `None` or an empty tag list both mean routine visits only.
    pub fn from_tags(tags: Option<Vec<String>>) -> Self {
        match tags {
            Some(tags) if !tags.is_empty() => Self::Tags(tags),
            _ => Self::Untagged,
        }
    }

    pub fn matches(&self, activity: Option<&str>) -> bool {
        match (self, activity) {
            (Self::Untagged, None) => true,
            (Self::Untagged, Some(_)) => false,
            (Self::Tags(tags), Some(tag)) => tags.iter().any(|t| t == tag),
            (Self::Tags(_), None) => false,
        }
    }
}

/// Parameters of one status report request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusQuery {
    pub clinic_ids: Vec<String>,
    #[serde(default)]
    pub activity: ActivityFilter,
    pub window: ReportWindow,
}

/// The four report columns, derived from a `FollowUpStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusFlags {
    pub protected: bool,
    pub lost_to_follow_up: bool,
    pub abandoned: bool,
    pub discontinued: bool,
}

impl From<FollowUpStatus> for StatusFlags {
    fn from(status: FollowUpStatus) -> Self {
        Self {
            protected: status == FollowUpStatus::Protected,
            lost_to_follow_up: status == FollowUpStatus::LostToFollowUp,
            abandoned: status == FollowUpStatus::Abandoned,
            discontinued: status == FollowUpStatus::Discontinued,
        }
    }
}

/// Canonical follow-up status of one client for one reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResult {
    pub client_code: String,
    pub client_name: String,
    pub clinic_id: String,
    /// Visit the status was computed from.
    pub visit_date: NaiveDate,
    pub scheduled_date: Option<NaiveDate>,
    pub method: Option<ContraceptiveMethod>,
    pub status: FollowUpStatus,
    #[serde(flatten)]
    pub flags: StatusFlags,
}

/// Per-status counts for dashboard charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: u32,
    pub protected: u32,
    pub lost_to_follow_up: u32,
    pub abandoned: u32,
    pub discontinued: u32,
    pub unclassified: u32,
}

impl StatusSummary {
    pub fn from_results(results: &[StatusResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            acc.total += 1;
            match r.status {
                FollowUpStatus::Protected => acc.protected += 1,
                FollowUpStatus::LostToFollowUp => acc.lost_to_follow_up += 1,
                FollowUpStatus::Abandoned => acc.abandoned += 1,
                FollowUpStatus::Discontinued => acc.discontinued += 1,
                FollowUpStatus::Unclassified => acc.unclassified += 1,
            }
            acc
        })
    }
}
