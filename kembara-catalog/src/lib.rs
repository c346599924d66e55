pub mod package;
pub mod pricing;
pub mod inventory;

pub use package::{Package, ServiceType, Vehicle};
pub use pricing::{format_sen, sen_from_major, PriceQuote, PricingConfig, PricingEngine};
pub use inventory::{available_capacity, effective_minimum, is_selectable, selectable_slots, SlotInventory};
