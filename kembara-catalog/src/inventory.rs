use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use kembara_shared::{PackageKind, TimeSlot};

/// Remaining units on a slot. Saturates at 0 when upstream reports more
/// bookings than capacity.
pub fn available_capacity(slot: &TimeSlot) -> u32 {
    if slot.booked_count > slot.capacity {
        tracing::warn!(
            "Slot {} reports bookedCount {} above capacity {}, treating as full",
            slot.time, slot.booked_count, slot.capacity
        );
    }
    slot.capacity.saturating_sub(slot.booked_count)
}

pub fn is_selectable(slot: &TimeSlot) -> bool {
    slot.is_available && available_capacity(slot) > 0
}

/// Slots a guest may choose. Everything else renders as sold out.
pub fn selectable_slots(slots: &[TimeSlot]) -> Vec<TimeSlot> {
    slots.iter().filter(|s| is_selectable(s)).cloned().collect()
}

/// Minimum party size to enforce for a slot.
///
/// Tours prefer the backend's `currentMinimum`, which reflects the
/// first-booking floor. Transfers never receive it and use `minimumPerson`.
/// Zero is read as "not reported".
pub fn effective_minimum(slot: &TimeSlot, kind: PackageKind, package_default: Option<u32>) -> u32 {
    let nonzero = |v: Option<u32>| v.filter(|n| *n > 0);

    let slot_value = match kind {
        PackageKind::Tour => nonzero(slot.current_minimum).or(nonzero(slot.minimum_person)),
        PackageKind::Transfer => nonzero(slot.minimum_person),
    };

    slot_value.or(nonzero(package_default)).unwrap_or(1)
}

/// The fetched slot list for one package and date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotInventory {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

impl SlotInventory {
    pub fn new(date: NaiveDate, slots: Vec<TimeSlot>) -> Self {
        Self { date, slots }
    }

    pub fn empty(date: NaiveDate) -> Self {
        Self { date, slots: Vec::new() }
    }

    pub fn find(&self, time: &str) -> Option<&TimeSlot> {
        self.slots.iter().find(|s| s.time == time)
    }

    pub fn selectable(&self) -> Vec<TimeSlot> {
        selectable_slots(&self.slots)
    }

    pub fn first_selectable(&self) -> Option<&TimeSlot> {
        self.slots.iter().find(|s| is_selectable(s))
    }

    pub fn has_selectable(&self) -> bool {
        self.first_selectable().is_some()
    }

    pub fn is_selectable(&self, time: &str) -> bool {
        self.find(time).map(is_selectable).unwrap_or(false)
    }

    /// Capacity left on a slot, 0 when the slot is unknown
    pub fn available_for(&self, time: &str) -> u32 {
        self.find(time).map(available_capacity).unwrap_or(0)
    }
}
