pub mod models;

pub use models::slot::{PackageKind, TimeSlot};
pub use models::events::SlotSnapshot;
