use chrono::NaiveDate;
use uuid::Uuid;
use crate::models::slot::{PackageKind, TimeSlot};

/// One refresh of a watched package/date, pushed to stream subscribers
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SlotSnapshot {
    pub watch_id: Uuid,
    pub kind: PackageKind,
    pub package_id: String,
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
    /// Set when the upstream fetch failed and `slots` was degraded to empty
    pub degraded: bool,
    pub fetched_at: i64,
}
