use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;
use kembara_booking::{BookingDraft, Reconciliation};
use kembara_catalog::SlotInventory;
use kembara_core::AvailabilityService;
use kembara_shared::{PackageKind, SlotSnapshot};

/// Package and date being watched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub kind: PackageKind,
    pub package_id: String,
    pub date: NaiveDate,
}

/// Polls the availability service for one target and publishes every
/// result. Only the latest target's fetch is ever published.
pub struct SlotWatcher;

impl SlotWatcher {
    pub fn spawn(service: Arc<dyn AvailabilityService>, target: WatchTarget, interval: Duration) -> WatchHandle {
        let watch_id = Uuid::new_v4();
        let (target_tx, target_rx) = watch::channel(target);
        let (snapshot_tx, snapshot_rx) = watch::channel(None);

        let task = tokio::spawn(poll_loop(watch_id, service, target_rx, snapshot_tx, interval));
        info!("Slot watcher {} started", watch_id);

        WatchHandle {
            watch_id,
            control: WatchControl { target_tx: Arc::new(target_tx), abort: task.abort_handle() },
            snapshots: snapshot_rx,
            registry: None,
        }
    }
}

async fn poll_loop(
    watch_id: Uuid,
    service: Arc<dyn AvailabilityService>,
    mut target_rx: watch::Receiver<WatchTarget>,
    snapshot_tx: watch::Sender<Option<SlotSnapshot>>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = target_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                ticker.reset();
            }
        }

        // Retry with the newest target whenever it moves mid-fetch
        let snapshot = loop {
            let target = target_rx.borrow_and_update().clone();
            tokio::select! {
                result = service.available_slots(target.kind, &target.package_id, target.date) => {
                    break snapshot_for(watch_id, &target, result);
                }
                changed = target_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    debug!("Watcher {} dropped superseded fetch for {}", watch_id, target.date);
                }
            }
        };

        if snapshot_tx.send(Some(snapshot)).is_err() {
            break;
        }
    }

    debug!("Slot watcher {} stopped", watch_id);
}

fn snapshot_for(
    watch_id: Uuid,
    target: &WatchTarget,
    result: kembara_core::CoreResult<Vec<kembara_shared::TimeSlot>>,
) -> SlotSnapshot {
    let (slots, degraded) = match result {
        Ok(slots) => (slots, false),
        Err(e) => {
            warn!("Watcher {} failed to fetch slots for {}: {}", watch_id, target.date, e);
            (Vec::new(), true)
        }
    };

    SlotSnapshot {
        watch_id,
        kind: target.kind,
        package_id: target.package_id.clone(),
        date: target.date,
        slots,
        degraded,
        fetched_at: Utc::now().timestamp(),
    }
}

#[derive(Clone)]
struct WatchControl {
    target_tx: Arc<watch::Sender<WatchTarget>>,
    abort: AbortHandle,
}

impl WatchControl {
    /// Switch to another date and fetch it right away
    fn retarget(&self, date: NaiveDate) {
        self.target_tx.send_modify(|t| t.date = date);
    }
}

/// Owner of a running watcher. Dropping it stops the task.
pub struct WatchHandle {
    watch_id: Uuid,
    control: WatchControl,
    snapshots: watch::Receiver<Option<SlotSnapshot>>,
    registry: Option<WatchRegistry>,
}

impl WatchHandle {
    pub fn id(&self) -> Uuid {
        self.watch_id
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SlotSnapshot>> {
        self.snapshots.clone()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.control.abort.abort();
        if let Some(registry) = &self.registry {
            registry.forget(self.watch_id);
        }
    }
}

/// Live watchers by id, so a subscriber can steer its stream from a
/// separate request. Entries leave when their handle drops.
#[derive(Clone, Default)]
pub struct WatchRegistry {
    live: Arc<Mutex<HashMap<Uuid, WatchControl>>>,
}

impl WatchRegistry {
    fn live(&self) -> MutexGuard<'_, HashMap<Uuid, WatchControl>> {
        self.live.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn track(&self, mut handle: WatchHandle) -> WatchHandle {
        self.live().insert(handle.watch_id, handle.control.clone());
        handle.registry = Some(self.clone());
        handle
    }

    /// False when no live watcher has this id
    pub fn retarget(&self, watch_id: Uuid, date: NaiveDate) -> bool {
        match self.live().get(&watch_id) {
            Some(control) => {
                control.retarget(date);
                true
            }
            None => false,
        }
    }

    pub fn cancel(&self, watch_id: Uuid) -> bool {
        match self.live().remove(&watch_id) {
            Some(control) => {
                control.abort.abort();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.live().is_empty()
    }

    fn forget(&self, watch_id: Uuid) {
        self.live().remove(&watch_id);
    }
}

/// What a subscriber sees for each snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SelectionEvent {
    pub snapshot: SlotSnapshot,
    pub selectable: Vec<kembara_shared::TimeSlot>,
    pub selected: Option<String>,
    pub reconciliation: Reconciliation,
}

/// Keeps a subscriber's selected time in line with each refresh
pub struct SelectionTracker {
    draft: BookingDraft,
}

impl SelectionTracker {
    pub fn new(draft: BookingDraft) -> Self {
        Self { draft }
    }

    pub fn selected(&self) -> Option<&str> {
        self.draft.selected_time()
    }

    pub fn observe(&mut self, snapshot: SlotSnapshot) -> SelectionEvent {
        if self.draft.date != Some(snapshot.date) {
            self.draft.date = Some(snapshot.date);
            self.draft.time = None;
        }

        let inventory = SlotInventory::new(snapshot.date, snapshot.slots.clone());
        let (draft, reconciliation) = self.draft.reconcile(&inventory);
        self.draft = draft;

        SelectionEvent {
            selectable: inventory.selectable(),
            selected: self.draft.time.clone(),
            reconciliation,
            snapshot,
        }
    }
}
