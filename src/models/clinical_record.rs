use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ClinicalDomain;

/// A record in any follow-up domain that carries a next scheduled date.
///
/// Obstetric and HIV-care records are stored with nothing beyond this;
/// family-planning plans project onto it for appointment reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledRecord {
    pub id: Uuid,
    pub domain: ClinicalDomain,
    pub visit_id: Uuid,
    pub client_id: Uuid,
    pub scheduled_date: Option<NaiveDate>,
}
