use serde::{Deserialize, Serialize};
use kembara_catalog::{inventory::available_capacity, Package};
use kembara_shared::{PackageKind, TimeSlot};
use crate::models::Party;

/// Guest-count constraints of one package
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartyRules {
    pub kind: PackageKind,
    pub vehicle: bool,
    pub maximum: u32,
    /// Seats per vehicle unit; adults move in steps of this size
    pub occupancy: u32,
}

/// Courtesy notice raised after an accepted change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartyNotice {
    MaximumReached { maximum: u32 },
}

impl PartyNotice {
    pub fn message(&self) -> String {
        match self {
            PartyNotice::MaximumReached { .. } => {
                "You have reached the maximum number of guests. Please contact us for more tickets.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartyError {
    #[error("Guest count cannot go below zero")]
    Negative,

    #[error("Private bookings are sold in groups of {occupancy}, got {requested}")]
    NotVehicleMultiple { occupancy: u32, requested: u32 },

    #[error("Private bookings need at least {occupancy} adults")]
    BelowVehicleOccupancy { occupancy: u32 },

    #[error("Maximum of {maximum} guests, requested {requested}")]
    ExceedsMaximum { maximum: u32, requested: u32 },

    #[error("Only {available} left on this slot, requested {requested}")]
    ExceedsCapacity { available: u32, requested: u32 },

    #[error("Children cannot be added to a private booking")]
    ChildrenNotAllowed,
}

impl PartyError {
    pub fn code(&self) -> &'static str {
        match self {
            PartyError::Negative => "negative_count",
            PartyError::NotVehicleMultiple { .. } => "not_vehicle_multiple",
            PartyError::BelowVehicleOccupancy { .. } => "below_vehicle_occupancy",
            PartyError::ExceedsMaximum { .. } => "exceeds_maximum",
            PartyError::ExceedsCapacity { .. } => "exceeds_capacity",
            PartyError::ChildrenNotAllowed => "children_not_allowed",
        }
    }
}

/// Starting party: one vehicle's worth of adults for private packages,
/// empty for shared ones
pub fn initial_party(package: &Package, occupancy: u32) -> Party {
    if package.is_vehicle_booking() {
        Party::new(occupancy, 0)
    } else {
        Party::default()
    }
}

fn step(current: u32, delta: i32) -> Result<u32, PartyError> {
    let next = current as i64 + delta as i64;
    if next < 0 {
        return Err(PartyError::Negative);
    }
    u32::try_from(next).map_err(|_| PartyError::ExceedsMaximum { maximum: u32::MAX, requested: u32::MAX })
}

impl PartyRules {
    pub fn for_package(package: &Package, occupancy: u32) -> Self {
        Self {
            kind: package.kind,
            vehicle: package.is_vehicle_booking(),
            maximum: package.maximum_guests(),
            occupancy: occupancy.max(1),
        }
    }

    /// Would `new_adults` be accepted given the rest of the party and the
    /// slot's remaining capacity
    pub fn check_adults(&self, new_adults: u32, party: &Party, available: u32) -> Result<(), PartyError> {
        if self.vehicle {
            if new_adults % self.occupancy != 0 {
                return Err(PartyError::NotVehicleMultiple { occupancy: self.occupancy, requested: new_adults });
            }
            if new_adults < self.occupancy {
                return Err(PartyError::BelowVehicleOccupancy { occupancy: self.occupancy });
            }
            return self.check_bounds(Some(new_adults), available);
        }

        self.check_bounds(new_adults.checked_add(party.children), available)
    }

    pub fn check_children(&self, new_children: u32, party: &Party, available: u32) -> Result<(), PartyError> {
        if self.vehicle {
            return Err(PartyError::ChildrenNotAllowed);
        }
        self.check_bounds(party.adults.checked_add(new_children), available)
    }

    /// Whether a whole party fits the package shape and limits, however it
    /// was put together
    pub fn check_party(&self, party: &Party, available: u32) -> Result<(), PartyError> {
        self.check_adults(party.adults, party, available)?;
        if party.children > 0 {
            self.check_children(party.children, party, available)?;
        }
        Ok(())
    }

    /// `None` is a count past `u32::MAX`, which no maximum admits
    fn check_bounds(&self, requested: Option<u32>, available: u32) -> Result<(), PartyError> {
        let requested = requested.ok_or(PartyError::ExceedsMaximum { maximum: self.maximum, requested: u32::MAX })?;
        if requested > self.maximum {
            return Err(PartyError::ExceedsMaximum { maximum: self.maximum, requested });
        }
        if requested > available {
            return Err(PartyError::ExceedsCapacity { available, requested });
        }
        Ok(())
    }

    /// Party after moving adults by `delta`, or why it was refused
    pub fn change_adults(&self, party: &Party, delta: i32, available: u32) -> Result<Party, PartyError> {
        let adults = step(party.adults, delta)?;
        self.check_adults(adults, party, available)?;
        Ok(Party::new(adults, party.children))
    }

    pub fn change_children(&self, party: &Party, delta: i32, available: u32) -> Result<Party, PartyError> {
        if self.vehicle {
            return Err(PartyError::ChildrenNotAllowed);
        }
        let children = step(party.children, delta)?;
        self.check_children(children, party, available)?;
        Ok(Party::new(party.adults, children))
    }

    pub fn notice_for(&self, party: &Party) -> Option<PartyNotice> {
        if self.maximum != u32::MAX && party.total_guests().map_or(true, |total| total >= self.maximum) {
            Some(PartyNotice::MaximumReached { maximum: self.maximum })
        } else {
            None
        }
    }
}

/// Whether the adults button for `delta` should be enabled. No slot
/// selected means nothing is available.
pub fn can_increment_adults(party: &Party, delta: i32, slot: Option<&TimeSlot>, rules: &PartyRules) -> bool {
    let available = slot.map(available_capacity).unwrap_or(0);
    rules.change_adults(party, delta, available).is_ok()
}

pub fn can_increment_children(party: &Party, delta: i32, slot: Option<&TimeSlot>, rules: &PartyRules) -> bool {
    let available = slot.map(available_capacity).unwrap_or(0);
    rules.change_children(party, delta, available).is_ok()
}
