use chrono::Utc;
use tracing::debug;
use uuid::Uuid;
use kembara_catalog::{available_capacity, effective_minimum, Package, PricingEngine, SlotInventory};
use kembara_shared::PackageKind;
use crate::models::{BookingDraft, BookingRequest};
use crate::party::{PartyError, PartyRules};

/// Why a draft cannot move on to guest info. Checked in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContinueError {
    #[error("Please select a date for your booking")]
    MissingDate,

    #[error("Please select a time slot for your booking")]
    MissingTime,

    #[error("Please select a valid time slot")]
    InvalidSlot { time: String },

    /// The party breaks the package's shape or maximum, whatever the slot
    #[error(transparent)]
    InvalidParty(#[from] PartyError),

    #[error("{}", below_minimum_message(.kind, .required, .actual, .first_booking))]
    BelowMinimum {
        kind: PackageKind,
        required: u32,
        actual: u32,
        /// Nobody has booked the slot yet; only changes the wording
        first_booking: bool,
    },

    #[error("{}", over_capacity_message(.available, .vehicle))]
    OverCapacity { available: u32, vehicle: bool },
}

fn plural(n: u32) -> &'static str {
    if n > 1 { "s" } else { "" }
}

fn below_minimum_message(kind: &PackageKind, required: &u32, actual: &u32, first_booking: &bool) -> String {
    let (required, actual) = (*required, *actual);
    match kind {
        PackageKind::Tour if *first_booking => format!(
            "First booking for this tour requires at least {} guest{}. Current: {}",
            required, plural(required), actual
        ),
        PackageKind::Tour => format!(
            "This time slot requires at least {} guest{}. Current: {}",
            required, plural(required), actual
        ),
        PackageKind::Transfer => format!(
            "Please select at least {} adult{} for this time slot. Current adults: {}",
            required, plural(required), actual
        ),
    }
}

fn over_capacity_message(available: &u32, vehicle: &bool) -> String {
    if *vehicle {
        "No vehicle units available for this time slot".to_string()
    } else {
        format!("Only {} seats available for this time.", available)
    }
}

impl ContinueError {
    /// Stable machine code for API clients
    pub fn code(&self) -> &'static str {
        match self {
            ContinueError::MissingDate => "missing_date",
            ContinueError::MissingTime => "missing_time",
            ContinueError::InvalidSlot { .. } => "invalid_slot",
            ContinueError::InvalidParty(e) => e.code(),
            ContinueError::BelowMinimum { .. } => "below_minimum",
            ContinueError::OverCapacity { .. } => "over_capacity",
        }
    }
}

/// Final gate before guest info. The party is re-checked against the
/// package rules since the draft comes from the client. Vehicle bookings
/// skip the minimum and only need one free unit.
pub fn validate_continue(
    draft: &BookingDraft,
    package: &Package,
    inventory: &SlotInventory,
    pricing: &PricingEngine,
) -> Result<BookingRequest, ContinueError> {
    let date = draft.date.ok_or(ContinueError::MissingDate)?;
    let time = draft.selected_time().ok_or(ContinueError::MissingTime)?;

    let slot = inventory
        .find(time)
        .filter(|_| inventory.date == date)
        .filter(|s| s.is_available)
        .ok_or_else(|| ContinueError::InvalidSlot { time: time.to_string() })?;

    let vehicle = package.is_vehicle_booking();
    let available = available_capacity(slot);
    let party = draft.party;

    // Seat capacity is compared below; only shape and maximum here
    PartyRules::for_package(package, pricing.vehicle_occupancy()).check_party(&party, u32::MAX)?;
    let guests = party.total_guests().ok_or(ContinueError::OverCapacity { available, vehicle })?;

    if vehicle {
        if available < 1 {
            return Err(ContinueError::OverCapacity { available, vehicle });
        }
    } else {
        let required = effective_minimum(slot, package.kind, package.minimum_person);
        let actual = match package.kind {
            PackageKind::Tour => guests,
            PackageKind::Transfer => party.adults,
        };

        if actual < required {
            return Err(ContinueError::BelowMinimum {
                kind: package.kind,
                required,
                actual,
                first_booking: slot.booked_count == 0,
            });
        }

        if guests > available {
            return Err(ContinueError::OverCapacity { available, vehicle });
        }
    }

    let quote = pricing.quote(package, party.adults, party.children);
    debug!(
        "Continue accepted for {} {} on {} at {}: {} sen",
        package.kind, package.id, date, time, quote.total_sen
    );

    Ok(BookingRequest {
        id: Uuid::new_v4(),
        package_id: package.id.clone(),
        slug: package.slug.clone(),
        title: package.title.clone(),
        kind: package.kind,
        date,
        time: time.to_string(),
        party,
        is_vehicle_booking: vehicle,
        units: if vehicle { 1 } else { guests },
        quote,
        created_at: Utc::now(),
    })
}
