use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use tracing::warn;
use kembara_catalog::{Package, PricingEngine, SlotInventory};
use kembara_core::AvailabilityService;
use kembara_shared::PackageKind;
use kembara_store::app_config::PollingConfig;
use crate::error::AppError;
use crate::watcher::WatchRegistry;

#[derive(Clone)]
pub struct AppState {
    pub availability: Arc<dyn AvailabilityService>,
    pub pricing: PricingEngine,
    pub polling: PollingConfig,
    pub watchers: WatchRegistry,
}

impl AppState {
    pub fn new(availability: Arc<dyn AvailabilityService>, pricing: PricingEngine, polling: PollingConfig) -> Self {
        Self { availability, pricing, polling, watchers: WatchRegistry::default() }
    }

    /// Server date, or the local UTC date when the clock endpoint is down
    pub async fn today(&self) -> NaiveDate {
        match self.availability.server_clock().await {
            Ok(clock) => clock.today(),
            Err(e) => {
                warn!("Server clock unavailable, falling back to local date: {}", e);
                Utc::now().date_naive()
            }
        }
    }

    pub async fn package(&self, kind: &str, slug: &str) -> Result<Package, AppError> {
        let kind: PackageKind = kind.parse().map_err(AppError::BadRequest)?;
        self.availability
            .package_by_slug(kind, slug)
            .await?
            .ok_or_else(|| AppError::NotFoundError(format!("{} not found: {}", kind, slug)))
    }

    /// Slots for a date. A failed lookup degrades to an empty list.
    pub async fn inventory(&self, package: &Package, date: NaiveDate) -> (SlotInventory, bool) {
        match self.availability.available_slots(package.kind, &package.id, date).await {
            Ok(slots) => (SlotInventory::new(date, slots), false),
            Err(e) => {
                warn!("Error fetching time slots for {} {} on {}: {}", package.kind, package.id, date, e);
                (SlotInventory::empty(date), true)
            }
        }
    }
}
