use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ContraceptiveMethod, LongActingMethod};

/// Family-planning follow-up recorded at one visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpPlan {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub method_dispensed: bool,
    pub method: Option<ContraceptiveMethod>,
    /// Next scheduled check-in. `None` when absent or unreadable in storage.
    pub scheduled_date: Option<NaiveDate>,
    /// Long-acting method removed at this visit.
    pub removal: Option<LongActingMethod>,
}

impl FollowUpPlan {
    /// The long-acting method inserted at this visit, if any.
    pub fn inserted_long_acting(&self) -> Option<LongActingMethod> {
        if !self.method_dispensed {
            return None;
        }
        self.method.and_then(|m| m.long_acting())
    }
}
