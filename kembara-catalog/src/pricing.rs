use serde::{Deserialize, Serialize};
use kembara_shared::PackageKind;
use crate::package::Package;

/// Convert an upstream major-unit amount (e.g. 85.5 RM) to sen
pub fn sen_from_major(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Render sen as a two-decimal major-unit string
pub fn format_sen(sen: i64) -> String {
    let sign = if sen < 0 { "-" } else { "" };
    let abs = sen.abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Seats per vehicle unit for private bookings
    pub vehicle_occupancy: u32,

    /// Cart tax rate (0.028 = 2.8%)
    pub tax_rate: f64,

    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            vehicle_occupancy: 8,
            tax_rate: 0.028,
            currency: "RM".to_string(),
        }
    }
}

/// Price of one booking request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub total_sen: i64,
    /// Display figure. For private tours this is the cost per seat, not charged.
    pub adult_unit_sen: i64,
    pub child_unit_sen: i64,
    pub per_vehicle: bool,
    pub currency: String,
}

#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    pub fn vehicle_occupancy(&self) -> u32 {
        self.config.vehicle_occupancy.max(1)
    }

    /// Flat vehicle price for private packages, per guest otherwise
    pub fn quote(&self, package: &Package, adults: u32, children: u32) -> PriceQuote {
        if package.is_vehicle_booking() {
            return PriceQuote {
                total_sen: package.new_price_sen,
                adult_unit_sen: self.adult_unit_price(package),
                child_unit_sen: package.child_price_sen,
                per_vehicle: true,
                currency: self.config.currency.clone(),
            };
        }

        let total = adults as i64 * package.new_price_sen + children as i64 * package.child_price_sen;

        PriceQuote {
            total_sen: total,
            adult_unit_sen: package.new_price_sen,
            child_unit_sen: package.child_price_sen,
            per_vehicle: false,
            currency: self.config.currency.clone(),
        }
    }

    /// Per-adult display price. Private tours spread the vehicle price over its seats.
    pub fn adult_unit_price(&self, package: &Package) -> i64 {
        if package.is_vehicle_booking() && package.kind == PackageKind::Tour {
            let occupancy = self.vehicle_occupancy() as i64;
            (package.new_price_sen + occupancy / 2) / occupancy
        } else {
            package.new_price_sen
        }
    }

    /// Tax on a cart subtotal, rounded to the sen
    pub fn tax(&self, subtotal_sen: i64) -> i64 {
        (subtotal_sen as f64 * self.config.tax_rate).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::ServiceType;

    #[test]
    fn test_private_tour_flat_price() {
        let engine = PricingEngine::default();
        let tour = Package::new(PackageKind::Tour, "p1", ServiceType::Private, sen_from_major(960.0));

        for adults in [8, 16, 24] {
            let quote = engine.quote(&tour, adults, 3);
            assert_eq!(quote.total_sen, 96000);
            assert!(quote.per_vehicle);
        }

        // RM 120 per seat, display only
        assert_eq!(engine.quote(&tour, 8, 0).adult_unit_sen, 12000);
    }

    #[test]
    fn test_shared_tour_per_guest() {
        let engine = PricingEngine::default();
        let tour = Package::new(PackageKind::Tour, "s1", ServiceType::Shared, sen_from_major(85.0))
            .with_child_price(sen_from_major(60.0));

        let quote = engine.quote(&tour, 2, 1);
        assert_eq!(quote.total_sen, 23000);
        assert_eq!(format_sen(quote.total_sen), "230.00");
        assert_eq!(quote.adult_unit_sen, 8500);
    }

    #[test]
    fn test_private_transfer_unit_price_not_split() {
        let engine = PricingEngine::default();
        let transfer = Package::new(PackageKind::Transfer, "x1", ServiceType::Private, 35000);
        assert_eq!(engine.adult_unit_price(&transfer), 35000);
        assert_eq!(engine.quote(&transfer, 8, 0).total_sen, 35000);
    }

    #[test]
    fn test_tax_rounding() {
        let engine = PricingEngine::default();
        assert_eq!(engine.tax(23000), 644);
        // 2.8% of RM 10.55 = 29.54 sen
        assert_eq!(engine.tax(1055), 30);
        assert_eq!(engine.tax(0), 0);
    }

    #[test]
    fn test_sen_conversion() {
        assert_eq!(sen_from_major(85.5), 8550);
        assert_eq!(sen_from_major(0.1 + 0.2), 30);
        assert_eq!(format_sen(-1205), "-12.05");
    }
}
