use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::plan::FollowUpPlan;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    pub date: NaiveDate,
    /// Activity or outreach location the visit was recorded under.
    /// `None` for routine in-clinic visits.
    pub activity: Option<String>,
    #[serde(default)]
    pub plans: Vec<FollowUpPlan>,
}
