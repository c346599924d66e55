use std::collections::HashMap;
use std::sync::Arc;
use chrono::NaiveDate;
use futures_util::future::join_all;
use tracing::{info, warn};
use kembara_catalog::PricingEngine;
use kembara_core::AvailabilityService;
use kembara_shared::PackageKind;
use crate::cart::{validate_slot, CartLine, CartReview, ItemStatus, RawCartItem, ReviewedItem, SlotValidation};

type GroupKey = (PackageKind, String, NaiveDate);

/// Re-checks a cart against live slot data
pub struct CartValidator {
    service: Arc<dyn AvailabilityService>,
    pricing: PricingEngine,
}

impl CartValidator {
    pub fn new(service: Arc<dyn AvailabilityService>, pricing: PricingEngine) -> Self {
        Self { service, pricing }
    }

    /// One slot fetch per (kind, package, date), all in flight together.
    /// A failed group leaves its items unverified and does not affect
    /// the others.
    pub async fn review(&self, items: &[RawCartItem], today: NaiveDate) -> CartReview {
        let normalized: Vec<(&RawCartItem, Option<CartLine>)> =
            items.iter().map(|raw| (raw, raw.normalize().ok())).collect();

        let mut groups: Vec<GroupKey> = Vec::new();
        for (_, line) in &normalized {
            if let Some(line) = line.as_ref().filter(|l| l.date >= today) {
                let key = (line.kind, line.package_id.clone(), line.date);
                if !groups.contains(&key) {
                    groups.push(key);
                }
            }
        }

        let fetches = groups.iter().map(|(kind, package_id, date)| {
            let service = self.service.clone();
            async move { service.available_slots(*kind, package_id, *date).await }
        });
        let results = join_all(fetches).await;

        let mut fetched = HashMap::new();
        for (key, result) in groups.into_iter().zip(results) {
            match result {
                Ok(slots) => {
                    fetched.insert(key, slots);
                }
                Err(e) => warn!("Slot lookup for {} {} on {} failed: {}", key.0, key.1, key.2, e),
            }
        }

        let reviewed: Vec<ReviewedItem> = normalized
            .into_iter()
            .map(|(raw, line)| {
                let total_price_sen = raw.total_price_sen();
                let Some(line) = line else {
                    return ReviewedItem {
                        id: raw.id.clone(),
                        line: None,
                        status: ItemStatus::Invalid,
                        validation: Some(SlotValidation::incomplete()),
                        total_price_sen,
                    };
                };

                let validation = if line.date < today {
                    Some(SlotValidation::expired())
                } else {
                    let key = (line.kind, line.package_id.clone(), line.date);
                    fetched.get(&key).map(|slots| validate_slot(slots, &line, today))
                };

                let status = match &validation {
                    Some(v) if v.is_valid => ItemStatus::Valid,
                    Some(_) => ItemStatus::Invalid,
                    None => ItemStatus::Unverified,
                };

                ReviewedItem { id: raw.id.clone(), line: Some(line), status, validation, total_price_sen }
            })
            .collect();

        let review = CartReview::new(reviewed, &self.pricing);
        info!(
            "Cart reviewed: {} items, {} invalid, subtotal {} sen",
            review.items.len(),
            review.invalid_ids().len(),
            review.subtotal_sen
        );
        review
    }
}
