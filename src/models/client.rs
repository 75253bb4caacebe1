use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Sex;
use super::visit::VisitRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: String,
    pub name: String,
}

/// A registered client with their visit history nested in date order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub sex: Sex,
    pub clinic_id: String,
    #[serde(default)]
    pub visits: Vec<VisitRecord>,
}
