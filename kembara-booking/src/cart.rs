use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use kembara_catalog::{available_capacity, sen_from_major, PricingEngine};
use kembara_shared::{PackageKind, TimeSlot};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartPackageDetails {
    pub slug: Option<String>,
    pub title: Option<String>,
}

/// Cart item as stored upstream. Field names differ between the tour and
/// transfer flows, so everything is optional here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartItem {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub package_id: Option<String>,
    pub package_type: Option<String>,
    pub package_details: Option<CartPackageDetails>,
    pub selected_date: Option<String>,
    pub booking_date: Option<String>,
    pub selected_time: Option<String>,
    pub time_slot: Option<String>,
    pub adults: Option<u32>,
    pub children: Option<u32>,
    pub guests: Option<u32>,
    pub total_price: Option<f64>,
}

/// Canonical cart line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    pub id: String,
    pub kind: PackageKind,
    pub package_id: String,
    pub date: NaiveDate,
    pub time: String,
    pub guests: u32,
    pub total_price_sen: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing booking information")]
pub struct IncompleteItem {
    pub id: String,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RawCartItem {
    pub fn total_price_sen(&self) -> i64 {
        self.total_price.map(sen_from_major).unwrap_or(0)
    }

    /// Reduce the item to a `CartLine`. ISO timestamps keep only their date.
    pub fn normalize(&self) -> Result<CartLine, IncompleteItem> {
        let incomplete = || IncompleteItem { id: self.id.clone() };

        let package_id = present(&self.package_id)
            .or_else(|| self.package_details.as_ref().and_then(|d| present(&d.slug)))
            .ok_or_else(incomplete)?;
        let kind: PackageKind = present(&self.package_type)
            .and_then(|t| t.parse().ok())
            .ok_or_else(incomplete)?;
        let raw_date = present(&self.selected_date)
            .or_else(|| present(&self.booking_date))
            .ok_or_else(incomplete)?;
        let time = present(&self.selected_time)
            .or_else(|| present(&self.time_slot))
            .ok_or_else(incomplete)?;

        let date_part = raw_date.split('T').next().unwrap_or(raw_date);
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| incomplete())?;

        let guests = match (self.adults, self.children) {
            (None, None) => self.guests.unwrap_or(0),
            (adults, children) => adults
                .unwrap_or(0)
                .checked_add(children.unwrap_or(0))
                .ok_or_else(incomplete)?,
        };

        Ok(CartLine {
            id: self.id.clone(),
            kind,
            package_id: package_id.to_string(),
            date,
            time: time.to_string(),
            guests,
            total_price_sen: self.total_price_sen(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotValidation {
    pub is_valid: bool,
    pub is_expired: bool,
    pub is_full: bool,
    pub message: String,
}

impl SlotValidation {
    fn valid() -> Self {
        Self { is_valid: true, is_expired: false, is_full: false, message: "Available".to_string() }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self { is_valid: false, is_expired: false, is_full: false, message: message.into() }
    }

    pub fn expired() -> Self {
        Self { is_expired: true, ..Self::invalid("This booking date has passed") }
    }

    fn full(available: u32) -> Self {
        let message = if available == 0 {
            "This time slot is fully booked".to_string()
        } else {
            format!("Only {} spots left for this time slot", available)
        };
        Self { is_full: true, ..Self::invalid(message) }
    }

    pub fn incomplete() -> Self {
        Self::invalid("Missing booking information")
    }
}

/// Re-check one line against the slots fetched for its date. A line with
/// no guests recorded (vehicle bookings) still needs one unit.
pub fn validate_slot(slots: &[TimeSlot], line: &CartLine, today: NaiveDate) -> SlotValidation {
    if line.date < today {
        return SlotValidation::expired();
    }

    let slot = match slots.iter().find(|s| s.time == line.time) {
        Some(slot) if slot.is_available => slot,
        _ => return SlotValidation::invalid("This time slot is no longer available"),
    };

    let available = available_capacity(slot);
    if line.guests.max(1) > available {
        return SlotValidation::full(available);
    }

    SlotValidation::valid()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Valid,
    Invalid,
    /// The slot lookup failed; the item is not held against the guest
    Unverified,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewedItem {
    pub id: String,
    pub line: Option<CartLine>,
    pub status: ItemStatus,
    pub validation: Option<SlotValidation>,
    pub total_price_sen: i64,
}

impl ReviewedItem {
    pub fn counts_toward_total(&self) -> bool {
        self.status != ItemStatus::Invalid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("No valid items in cart")]
    NoValidItems,

    #[error("Please remove unavailable items before checkout")]
    InvalidItemsPresent { ids: Vec<String> },
}

impl CheckoutError {
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::EmptyCart => "empty_cart",
            CheckoutError::NoValidItems => "no_valid_items",
            CheckoutError::InvalidItemsPresent { .. } => "invalid_items_present",
        }
    }
}

/// Every item of the cart with its verdict. Invalid items stay listed but
/// are left out of the totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartReview {
    pub items: Vec<ReviewedItem>,
    pub subtotal_sen: i64,
    pub tax_sen: i64,
    pub total_sen: i64,
    pub currency: String,
}

impl CartReview {
    pub fn new(items: Vec<ReviewedItem>, pricing: &PricingEngine) -> Self {
        let subtotal_sen: i64 = items
            .iter()
            .filter(|i| i.counts_toward_total())
            .map(|i| i.total_price_sen)
            .sum();
        let tax_sen = pricing.tax(subtotal_sen);

        Self {
            items,
            subtotal_sen,
            tax_sen,
            total_sen: subtotal_sen + tax_sen,
            currency: pricing.config().currency.clone(),
        }
    }

    pub fn invalid_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| i.status == ItemStatus::Invalid)
            .map(|i| i.id.clone())
            .collect()
    }

    pub fn payable(&self) -> impl Iterator<Item = &ReviewedItem> {
        self.items.iter().filter(|i| i.counts_toward_total())
    }

    pub fn ready_for_checkout(&self) -> Result<(), CheckoutError> {
        if self.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if self.payable().next().is_none() {
            return Err(CheckoutError::NoValidItems);
        }
        let ids = self.invalid_ids();
        if !ids.is_empty() {
            return Err(CheckoutError::InvalidItemsPresent { ids });
        }
        Ok(())
    }
}
