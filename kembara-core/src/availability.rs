use async_trait::async_trait;
use chrono::NaiveDate;
use kembara_catalog::Package;
use kembara_shared::{PackageKind, TimeSlot};
use crate::calendar::ServerClock;
use crate::CoreResult;

/// Read side of the external availability service. It is the single
/// source of truth for slot state; nothing here caches or holds seats.
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    /// Slots for a package on a calendar day
    async fn available_slots(
        &self,
        kind: PackageKind,
        package_id: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<TimeSlot>>;

    /// The backend's notion of "now"
    async fn server_clock(&self) -> CoreResult<ServerClock>;

    async fn package_by_slug(
        &self,
        kind: PackageKind,
        slug: &str,
    ) -> CoreResult<Option<Package>>;
}
