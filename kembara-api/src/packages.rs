use std::convert::Infallible;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};
use uuid::Uuid;
use kembara_booking::{BookingDraft, Party};
use kembara_catalog::{Package, PricingEngine};
use kembara_core::{find_next_available_date, minimum_booking_date};
use kembara_shared::TimeSlot;
use crate::error::AppError;
use crate::state::AppState;
use crate::watcher::{SelectionTracker, SlotWatcher, WatchTarget};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/packages/{kind}/{slug}", get(get_package))
        .route("/v1/packages/{kind}/{slug}/slots", get(get_slots))
        .route("/v1/packages/{kind}/{slug}/next-available", get(next_available))
        .route("/v1/packages/{kind}/{slug}/slots/stream", get(stream_slots))
        .route("/v1/streams/{id}", delete(close_stream))
        .route("/v1/streams/{id}/date", post(retarget_stream))
}

#[derive(Debug, Serialize)]
pub struct PackageResponse {
    #[serde(flatten)]
    pub package: Package,
    pub is_vehicle_booking: bool,
    /// Display price per adult (per seat for private tours)
    pub adult_unit_sen: i64,
    pub vehicle_seats: Option<u32>,
}

impl PackageResponse {
    fn new(package: Package, pricing: &PricingEngine) -> Self {
        Self {
            is_vehicle_booking: package.is_vehicle_booking(),
            adult_unit_sen: pricing.adult_unit_price(&package),
            vehicle_seats: package.vehicle_seats(),
            package,
        }
    }
}

async fn get_package(
    State(state): State<AppState>,
    Path((kind, slug)): Path<(String, String)>,
) -> Result<Json<PackageResponse>, AppError> {
    let package = state.package(&kind, &slug).await?;
    Ok(Json(PackageResponse::new(package, &state.pricing)))
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
    pub selectable: Vec<TimeSlot>,
    pub degraded: bool,
}

async fn get_slots(
    State(state): State<AppState>,
    Path((kind, slug)): Path<(String, String)>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let package = state.package(&kind, &slug).await?;
    let date = match query.date {
        Some(date) => date,
        None => minimum_booking_date(state.today().await),
    };

    let (inventory, degraded) = state.inventory(&package, date).await;
    debug!("Fetched {} time slots for {} on {}", inventory.slots.len(), package.id, date);

    Ok(Json(SlotsResponse {
        date,
        selectable: inventory.selectable(),
        slots: inventory.slots,
        degraded,
    }))
}

#[derive(Debug, Deserialize)]
pub struct NextAvailableQuery {
    pub from: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct NextAvailableResponse {
    pub date: NaiveDate,
    pub earliest_date: NaiveDate,
}

async fn next_available(
    State(state): State<AppState>,
    Path((kind, slug)): Path<(String, String)>,
    Query(query): Query<NextAvailableQuery>,
) -> Result<Json<NextAvailableResponse>, AppError> {
    let package = state.package(&kind, &slug).await?;
    let earliest_date = minimum_booking_date(state.today().await);
    let start = query.from.map(|d| d.max(earliest_date)).unwrap_or(earliest_date);

    let date = find_next_available_date(
        state.availability.as_ref(),
        package.kind,
        &package.id,
        start,
        state.polling.lookahead_days,
    )
    .await;

    Ok(Json(NextAvailableResponse { date, earliest_date }))
}

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub date: Option<NaiveDate>,
    pub selected: Option<String>,
}

/// Live slot list for one date. Each `slots` event carries the refreshed
/// slots and the subscriber's reconciled selection.
async fn stream_slots(
    State(state): State<AppState>,
    Path((kind, slug)): Path<(String, String)>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let package = state.package(&kind, &slug).await?;
    let date = match query.date {
        Some(date) => date,
        None => minimum_booking_date(state.today().await),
    };

    let handle = state.watchers.track(SlotWatcher::spawn(
        state.availability.clone(),
        WatchTarget { kind: package.kind, package_id: package.id.clone(), date },
        state.polling.interval(),
    ));
    info!("Streaming slots for {} {} on {} (watcher {})", package.kind, package.id, date, handle.id());

    let mut draft = BookingDraft::new(&package.id, package.kind, Party::default());
    draft.date = Some(date);
    draft.time = query.selected.filter(|t| !t.is_empty());
    let mut tracker = SelectionTracker::new(draft);

    let stream = WatchStream::new(handle.subscribe()).filter_map(move |snapshot| {
        // the handle lives as long as the stream does
        let _watcher = &handle;
        let event = snapshot.map(|snapshot| {
            let selection = tracker.observe(snapshot);
            let event = Event::default().event("slots");
            Ok(event.json_data(&selection).unwrap_or_else(|_| Event::default().event("error")))
        });
        futures_util::future::ready(event)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[derive(Debug, Deserialize)]
pub struct RetargetRequest {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct RetargetResponse {
    pub watch_id: Uuid,
    pub date: NaiveDate,
}

/// Move an open stream to another date. The stream's next event is for the
/// new date; a fetch still running for the old one is never sent.
async fn retarget_stream(
    State(state): State<AppState>,
    Path(watch_id): Path<Uuid>,
    Json(req): Json<RetargetRequest>,
) -> Result<Json<RetargetResponse>, AppError> {
    let earliest = minimum_booking_date(state.today().await);
    if req.date < earliest {
        return Err(AppError::rejected("date_too_early", format!("Bookings open from {}", earliest)));
    }

    if !state.watchers.retarget(watch_id, req.date) {
        return Err(AppError::NotFoundError(format!("No open stream {}", watch_id)));
    }
    info!("Stream {} moved to {}", watch_id, req.date);
    Ok(Json(RetargetResponse { watch_id, date: req.date }))
}

async fn close_stream(
    State(state): State<AppState>,
    Path(watch_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.watchers.cancel(watch_id) {
        return Err(AppError::NotFoundError(format!("No open stream {}", watch_id)));
    }
    info!("Stream {} closed", watch_id);
    Ok(StatusCode::NO_CONTENT)
}
