use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use kembara_catalog::{Package, PricingEngine, SlotInventory};
use crate::models::{BookingDraft, BookingRequest, DraftAction};
use crate::party::{PartyError, PartyNotice, PartyRules};
use crate::validation::{validate_continue, ContinueError};

/// Everything a draft action is evaluated against
#[derive(Debug, Clone, Copy)]
pub struct DraftContext<'a> {
    pub package: &'a Package,
    /// Slots for the draft's current date
    pub inventory: &'a SlotInventory,
    /// Earliest bookable day (tomorrow, by server clock)
    pub earliest_date: NaiveDate,
    pub occupancy: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftUpdate {
    pub draft: BookingDraft,
    pub notice: Option<PartyNotice>,
}

/// Outcome of re-checking a selection against freshly fetched slots
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reconciliation {
    Unchanged,
    /// The selected slot vanished, was disabled, or filled up
    Cleared { time: String },
    /// Nothing was selected and the first open slot was picked
    AutoSelected { time: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("Bookings open from {earliest}")]
    DateTooEarly { earliest: NaiveDate },

    #[error("Please select a date first")]
    DateNotSelected,

    #[error("Time slot {time} cannot be selected")]
    SlotNotSelectable { time: String },

    #[error("Slot list is for {inventory}, draft is on {draft}")]
    StaleInventory { inventory: NaiveDate, draft: NaiveDate },

    #[error("Draft is for package {draft}, not {package}")]
    PackageMismatch { draft: String, package: String },

    #[error(transparent)]
    Party(#[from] PartyError),
}

impl DraftError {
    pub fn code(&self) -> &'static str {
        match self {
            DraftError::DateTooEarly { .. } => "date_too_early",
            DraftError::DateNotSelected => "date_not_selected",
            DraftError::SlotNotSelectable { .. } => "slot_not_selectable",
            DraftError::StaleInventory { .. } => "stale_inventory",
            DraftError::PackageMismatch { .. } => "package_mismatch",
            DraftError::Party(e) => e.code(),
        }
    }
}

impl BookingDraft {
    /// Evaluate one action. A refused action leaves the draft as it was.
    pub fn apply(&self, action: &DraftAction, ctx: &DraftContext<'_>) -> Result<DraftUpdate, DraftError> {
        if ctx.package.id != self.package_id {
            return Err(DraftError::PackageMismatch {
                draft: self.package_id.clone(),
                package: ctx.package.id.clone(),
            });
        }

        let rules = PartyRules::for_package(ctx.package, ctx.occupancy);

        match action {
            DraftAction::SelectDate(date) => {
                if *date < ctx.earliest_date {
                    return Err(DraftError::DateTooEarly { earliest: ctx.earliest_date });
                }
                let mut next = self.clone();
                next.date = Some(*date);
                Ok(DraftUpdate { draft: next, notice: None })
            }
            DraftAction::SelectTime(time) => {
                self.require_current(ctx)?;
                if !ctx.inventory.is_selectable(time) {
                    return Err(DraftError::SlotNotSelectable { time: time.clone() });
                }
                let mut next = self.clone();
                next.time = Some(time.clone());
                Ok(DraftUpdate { draft: next, notice: None })
            }
            DraftAction::ChangeAdults(delta) => {
                let available = self.available(ctx)?;
                let party = rules.change_adults(&self.party, *delta, available)?;
                let mut next = self.clone();
                next.party = party;
                Ok(DraftUpdate { notice: rules.notice_for(&party), draft: next })
            }
            DraftAction::ChangeChildren(delta) => {
                let available = self.available(ctx)?;
                let party = rules.change_children(&self.party, *delta, available)?;
                let mut next = self.clone();
                next.party = party;
                Ok(DraftUpdate { notice: rules.notice_for(&party), draft: next })
            }
        }
    }

    fn require_current(&self, ctx: &DraftContext<'_>) -> Result<(), DraftError> {
        let date = self.date.ok_or(DraftError::DateNotSelected)?;
        if date != ctx.inventory.date {
            return Err(DraftError::StaleInventory { inventory: ctx.inventory.date, draft: date });
        }
        Ok(())
    }

    /// Capacity on the selected slot; 0 until a slot is chosen
    fn available(&self, ctx: &DraftContext<'_>) -> Result<u32, DraftError> {
        match (self.date, self.selected_time()) {
            (Some(_), Some(time)) => {
                self.require_current(ctx)?;
                Ok(ctx.inventory.available_for(time))
            }
            _ => Ok(0),
        }
    }

    /// Re-check the selection after a slot refresh. Last fetch wins.
    pub fn reconcile(&self, inventory: &SlotInventory) -> (BookingDraft, Reconciliation) {
        if self.date != Some(inventory.date) {
            return (self.clone(), Reconciliation::Unchanged);
        }

        match self.selected_time() {
            Some(time) if !inventory.is_selectable(time) => {
                debug!("Clearing unavailable selected time {} on {}", time, inventory.date);
                let mut next = self.clone();
                next.time = None;
                (next, Reconciliation::Cleared { time: time.to_string() })
            }
            Some(_) => (self.clone(), Reconciliation::Unchanged),
            None => match inventory.first_selectable() {
                Some(slot) => {
                    debug!("Auto-selecting first available time slot {}", slot.time);
                    let mut next = self.clone();
                    next.time = Some(slot.time.clone());
                    (next, Reconciliation::AutoSelected { time: slot.time.clone() })
                }
                None => (self.clone(), Reconciliation::Unchanged),
            },
        }
    }

    /// Freeze the draft for the guest-info step
    pub fn continue_to_guest_info(
        &self,
        package: &Package,
        inventory: &SlotInventory,
        pricing: &PricingEngine,
    ) -> Result<BookingRequest, ContinueError> {
        validate_continue(self, package, inventory, pricing)
    }
}
