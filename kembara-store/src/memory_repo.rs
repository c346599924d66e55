use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use kembara_catalog::Package;
use kembara_core::{AvailabilityService, CoreError, CoreResult, ServerClock};
use kembara_shared::{PackageKind, TimeSlot};

type SlotKey = (PackageKind, String, NaiveDate);

#[derive(Default)]
struct State {
    packages: HashMap<(PackageKind, String), Package>,
    slots: HashMap<SlotKey, Vec<TimeSlot>>,
    failing: HashSet<SlotKey>,
    today: Option<NaiveDate>,
}

/// Availability backend held in memory, for tests and local runs
#[derive(Default)]
pub struct InMemoryAvailability {
    state: Mutex<State>,
    slot_fetches: AtomicUsize,
}

impl InMemoryAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pin the server date. Unset means the real UTC date.
    pub fn set_today(&self, date: NaiveDate) {
        self.state().today = Some(date);
    }

    /// Register a package under its slug
    pub fn insert_package(&self, package: Package) {
        self.state().packages.insert((package.kind, package.slug.clone()), package);
    }

    pub fn set_slots(&self, kind: PackageKind, package_id: &str, date: NaiveDate, slots: Vec<TimeSlot>) {
        let key = (kind, package_id.to_string(), date);
        let mut state = self.state();
        state.failing.remove(&key);
        state.slots.insert(key, slots);
    }

    /// Make lookups for this package and date fail
    pub fn fail_slots(&self, kind: PackageKind, package_id: &str, date: NaiveDate) {
        self.state().failing.insert((kind, package_id.to_string(), date));
    }

    /// Number of `available_slots` calls served so far
    pub fn slot_fetches(&self) -> usize {
        self.slot_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilityService for InMemoryAvailability {
    async fn available_slots(
        &self,
        kind: PackageKind,
        package_id: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<TimeSlot>> {
        self.slot_fetches.fetch_add(1, Ordering::SeqCst);

        let key = (kind, package_id.to_string(), date);
        let state = self.state();
        if state.failing.contains(&key) {
            return Err(CoreError::UpstreamError(format!("slot lookup failed for {} on {}", package_id, date)));
        }
        Ok(state.slots.get(&key).cloned().unwrap_or_default())
    }

    async fn server_clock(&self) -> CoreResult<ServerClock> {
        let now = Utc::now();
        let today = self.state().today.unwrap_or_else(|| now.date_naive());
        let noon = today.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()).and_utc();

        Ok(ServerClock {
            date: today.format("%Y-%m-%d").to_string(),
            time: noon.format("%H:%M").to_string(),
            long_date: today.format("%A, %B %-d, %Y").to_string(),
            full_date_time: noon,
        })
    }

    async fn package_by_slug(&self, kind: PackageKind, slug: &str) -> CoreResult<Option<Package>> {
        Ok(self.state().packages.get(&(kind, slug.to_string())).cloned())
    }
}
