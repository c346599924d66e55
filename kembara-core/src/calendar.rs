use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use kembara_catalog::inventory::selectable_slots;
use kembara_shared::PackageKind;
use crate::availability::AvailabilityService;

/// How far ahead to look for an open date
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 30;

/// Server date/time as reported by `/api/timeslots/server-datetime`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerClock {
    /// Local (business timezone) date, "YYYY-MM-DD"
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub long_date: String,
    pub full_date_time: DateTime<Utc>,
}

impl ServerClock {
    /// Business-local date, falling back to the UTC date of `full_date_time`
    pub fn today(&self) -> NaiveDate {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .unwrap_or_else(|_| self.full_date_time.date_naive())
    }
}

/// Bookings open from tomorrow
pub fn minimum_booking_date(today: NaiveDate) -> NaiveDate {
    today.checked_add_days(Days::new(1)).unwrap_or(today)
}

/// First date from `start` (inclusive) with at least one selectable slot.
/// A day whose lookup fails is skipped. Returns `start` when nothing opens
/// within `max_days`.
pub async fn find_next_available_date(
    service: &dyn AvailabilityService,
    kind: PackageKind,
    package_id: &str,
    start: NaiveDate,
    max_days: u32,
) -> NaiveDate {
    let mut current = start;

    for _ in 0..max_days {
        match service.available_slots(kind, package_id, current).await {
            Ok(slots) => {
                if !selectable_slots(&slots).is_empty() {
                    debug!("Found available slots for {} {} on {}", kind, package_id, current);
                    return current;
                }
            }
            Err(e) => warn!("Error checking date {} for {} {}: {}", current, kind, package_id, e),
        }

        current = match current.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    debug!("No available slots for {} {} in the next {} days", kind, package_id, max_days);
    start
}
