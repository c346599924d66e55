use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use kembara_booking::{CartLine, CartReview, CartValidator, CheckoutError, RawCartItem};
use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cart/review", post(review_cart))
        .route("/v1/cart/checkout", post(checkout))
}

#[derive(Debug, Deserialize)]
pub struct CartRequest {
    #[serde(default)]
    pub items: Vec<RawCartItem>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub lines: Vec<CartLine>,
    pub subtotal_sen: i64,
    pub tax_sen: i64,
    pub total_sen: i64,
    pub currency: String,
}

async fn review(state: &AppState, items: &[RawCartItem]) -> CartReview {
    let today = state.today().await;
    CartValidator::new(state.availability.clone(), state.pricing.clone())
        .review(items, today)
        .await
}

async fn review_cart(
    State(state): State<AppState>,
    Json(req): Json<CartRequest>,
) -> Result<Json<CartReview>, AppError> {
    Ok(Json(review(&state, &req.items).await))
}

/// Checkout only goes ahead once every flagged item has been removed
async fn checkout(
    State(state): State<AppState>,
    Json(req): Json<CartRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let review = review(&state, &req.items).await;

    if let Err(e) = review.ready_for_checkout() {
        let err = AppError::rejected(e.code(), &e);
        return Err(match e {
            CheckoutError::InvalidItemsPresent { ids } => err.with_details(json!({ "invalid_ids": ids })),
            _ => err,
        });
    }

    let lines: Vec<CartLine> = review.payable().filter_map(|item| item.line.clone()).collect();
    info!("Checkout accepted: {} lines, total {} sen", lines.len(), review.total_sen);

    Ok(Json(CheckoutResponse {
        lines,
        subtotal_sen: review.subtotal_sen,
        tax_sen: review.tax_sen,
        total_sen: review.total_sen,
        currency: review.currency.clone(),
    }))
}
