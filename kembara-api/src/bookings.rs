use axum::{extract::State, routing::post, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use kembara_booking::{
    initial_party, BookingDraft, BookingRequest, DraftAction, DraftContext, PartyNotice, Reconciliation,
};
use kembara_catalog::{PriceQuote, SlotInventory};
use kembara_core::minimum_booking_date;
use kembara_shared::TimeSlot;
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings/draft", post(create_draft))
        .route("/v1/bookings/draft/apply", post(apply_action))
        .route("/v1/bookings/continue", post(continue_booking))
}

#[derive(Debug, Deserialize)]
pub struct CreateDraftRequest {
    pub kind: String,
    pub slug: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyActionRequest {
    pub kind: String,
    pub slug: String,
    pub draft: BookingDraft,
    pub action: DraftAction,
}

#[derive(Debug, Deserialize)]
pub struct ContinueRequest {
    pub kind: String,
    pub slug: String,
    pub draft: BookingDraft,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: BookingDraft,
    pub notice: Option<PartyNotice>,
    pub notice_message: Option<String>,
    pub reconciliation: Reconciliation,
    pub earliest_date: NaiveDate,
    pub slots: Vec<TimeSlot>,
    pub selectable: Vec<TimeSlot>,
    pub degraded: bool,
    pub quote: PriceQuote,
}

struct Evaluated {
    draft: BookingDraft,
    notice: Option<PartyNotice>,
    inventory: SlotInventory,
    degraded: bool,
}

fn respond(
    state: &AppState,
    package: &kembara_catalog::Package,
    earliest_date: NaiveDate,
    evaluated: Evaluated,
) -> DraftResponse {
    let Evaluated { draft, notice, inventory, degraded } = evaluated;
    let (draft, reconciliation) = draft.reconcile(&inventory);
    let quote = state.pricing.quote(package, draft.party.adults, draft.party.children);

    DraftResponse {
        notice_message: notice.as_ref().map(PartyNotice::message),
        notice,
        reconciliation,
        earliest_date,
        selectable: inventory.selectable(),
        slots: inventory.slots,
        degraded,
        quote,
        draft,
    }
}

/// Fresh draft on the requested (or earliest) date with the package's
/// starting party and the first open slot selected
async fn create_draft(
    State(state): State<AppState>,
    Json(req): Json<CreateDraftRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    let package = state.package(&req.kind, &req.slug).await?;
    let earliest_date = minimum_booking_date(state.today().await);

    let party = initial_party(&package, state.pricing.vehicle_occupancy());
    let draft = BookingDraft::new(&package.id, package.kind, party);
    let update = draft
        .apply(
            &DraftAction::SelectDate(req.date.unwrap_or(earliest_date)),
            &DraftContext {
                package: &package,
                inventory: &SlotInventory::empty(earliest_date),
                earliest_date,
                occupancy: state.pricing.vehicle_occupancy(),
            },
        )
        .map_err(|e| AppError::rejected(e.code(), e))?;

    let date = update.draft.date.unwrap_or(earliest_date);
    let (inventory, degraded) = state.inventory(&package, date).await;
    info!("New draft for {} {} on {}", package.kind, package.id, date);

    let evaluated = Evaluated { draft: update.draft, notice: None, inventory, degraded };
    Ok(Json(respond(&state, &package, earliest_date, evaluated)))
}

/// Apply one change against live slot data, then reconcile the selection
async fn apply_action(
    State(state): State<AppState>,
    Json(req): Json<ApplyActionRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    let package = state.package(&req.kind, &req.slug).await?;
    let earliest_date = minimum_booking_date(state.today().await);

    let (current, mut degraded) = match (&req.action, req.draft.date) {
        (DraftAction::SelectDate(_), _) | (_, None) => (SlotInventory::empty(earliest_date), false),
        (_, Some(date)) => state.inventory(&package, date).await,
    };

    let ctx = DraftContext {
        package: &package,
        inventory: &current,
        earliest_date,
        occupancy: state.pricing.vehicle_occupancy(),
    };
    let update = req
        .draft
        .apply(&req.action, &ctx)
        .map_err(|e| AppError::rejected(e.code(), e))?;

    let inventory = match update.draft.date {
        Some(date) if date != current.date || matches!(req.action, DraftAction::SelectDate(_)) => {
            let (fresh, fresh_degraded) = state.inventory(&package, date).await;
            degraded = fresh_degraded;
            fresh
        }
        _ => current,
    };

    let evaluated = Evaluated { draft: update.draft, notice: update.notice, inventory, degraded };
    Ok(Json(respond(&state, &package, earliest_date, evaluated)))
}

/// Final check against freshly fetched slots before guest info
async fn continue_booking(
    State(state): State<AppState>,
    Json(req): Json<ContinueRequest>,
) -> Result<Json<BookingRequest>, AppError> {
    let package = state.package(&req.kind, &req.slug).await?;
    if req.draft.package_id != package.id {
        return Err(AppError::BadRequest(format!(
            "Draft is for package {}, not {}",
            req.draft.package_id, package.id
        )));
    }

    let inventory = match req.draft.date {
        Some(date) => state.inventory(&package, date).await.0,
        None => SlotInventory::empty(minimum_booking_date(state.today().await)),
    };

    let request = req
        .draft
        .continue_to_guest_info(&package, &inventory, &state.pricing)
        .map_err(|e| AppError::rejected(e.code(), e))?;

    info!(
        "Booking request {} ready: {} {} on {} at {} for {}+{} guests total {} sen",
        request.id, request.kind, request.package_id, request.date, request.time,
        request.party.adults, request.party.children, request.quote.total_sen
    );
    Ok(Json(request))
}
