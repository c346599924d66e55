use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use kembara_catalog::PriceQuote;
use kembara_shared::PackageKind;

/// Guests in a booking
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Party {
    pub adults: u32,
    pub children: u32,
}

impl Party {
    pub fn new(adults: u32, children: u32) -> Self {
        Self { adults, children }
    }

    /// `None` when the counts overflow `u32`
    pub fn total_guests(&self) -> Option<u32> {
        self.adults.checked_add(self.children)
    }
}

/// A booking being configured. Never mutated in place: every change goes
/// through a `DraftAction` and yields a new draft.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingDraft {
    pub package_id: String,
    pub kind: PackageKind,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub party: Party,
}

impl BookingDraft {
    pub fn new(package_id: &str, kind: PackageKind, party: Party) -> Self {
        Self {
            package_id: package_id.to_string(),
            kind,
            date: None,
            time: None,
            party,
        }
    }

    pub fn selected_time(&self) -> Option<&str> {
        self.time.as_deref().filter(|t| !t.is_empty())
    }
}

/// The changes a guest can make while configuring a booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DraftAction {
    SelectDate(NaiveDate),
    SelectTime(String),
    /// Signed step, e.g. +1 / -1 (or +8 / -8 for vehicles)
    ChangeAdults(i32),
    ChangeChildren(i32),
}

/// A draft frozen at the "continue to guest info" step, handed to payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: Uuid,
    pub package_id: String,
    pub slug: String,
    pub title: String,
    pub kind: PackageKind,
    pub date: NaiveDate,
    pub time: String,
    pub party: Party,
    pub is_vehicle_booking: bool,
    /// Capacity units consumed: 1 vehicle, or one per guest
    pub units: u32,
    pub quote: PriceQuote,
    pub created_at: DateTime<Utc>,
}
