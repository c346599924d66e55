use serde::{Deserialize, Serialize};
use kembara_shared::PackageKind;

/// Whether a package is sold per guest or per vehicle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceType {
    /// Co-tour / shared seats, priced and minimum-filled per guest
    Shared,
    /// Whole vehicle, priced and capacity-limited per unit
    Private,
}

impl ServiceType {
    /// Tours label it "private", transfers "Private". Anything else is shared.
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(l) if l.trim().eq_ignore_ascii_case("private") => ServiceType::Private,
            _ => ServiceType::Shared,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vehicle {
    pub name: String,
    pub seats: u32,
    pub units: u32,
}

/// Canonical tour or transfer offering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub kind: PackageKind,
    pub service: ServiceType,
    /// Raw upstream type label, kept for display
    pub type_label: Option<String>,
    pub new_price_sen: i64,
    pub child_price_sen: i64,
    pub minimum_person: Option<u32>,
    /// None means unbounded
    pub maximum_person: Option<u32>,
    pub vehicle: Option<Vehicle>,
    pub seat_capacity: Option<u32>,
    pub duration: Option<String>,
}

impl Package {
    pub fn new(kind: PackageKind, id: &str, service: ServiceType, new_price_sen: i64) -> Self {
        Self {
            id: id.to_string(),
            slug: id.to_string(),
            title: id.to_string(),
            kind,
            service,
            type_label: None,
            new_price_sen,
            child_price_sen: 0,
            minimum_person: None,
            maximum_person: None,
            vehicle: None,
            seat_capacity: None,
            duration: None,
        }
    }

    pub fn with_child_price(mut self, child_price_sen: i64) -> Self {
        self.child_price_sen = child_price_sen;
        self
    }

    pub fn with_limits(mut self, minimum_person: Option<u32>, maximum_person: Option<u32>) -> Self {
        self.minimum_person = minimum_person;
        self.maximum_person = maximum_person;
        self
    }

    pub fn with_slug(mut self, slug: &str) -> Self {
        self.slug = slug.to_string();
        self
    }

    pub fn is_vehicle_booking(&self) -> bool {
        self.service == ServiceType::Private
    }

    pub fn maximum_guests(&self) -> u32 {
        self.maximum_person.unwrap_or(u32::MAX)
    }

    /// Seats in the vehicle, for private transfers falling back to the maximum
    pub fn vehicle_seats(&self) -> Option<u32> {
        self.vehicle
            .as_ref()
            .map(|v| v.seats)
            .filter(|s| *s > 0)
            .or(self.seat_capacity)
            .or(self.maximum_person)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_labels() {
        assert_eq!(ServiceType::from_label(Some("private")), ServiceType::Private);
        assert_eq!(ServiceType::from_label(Some("Private")), ServiceType::Private);
        assert_eq!(ServiceType::from_label(Some("co-tour")), ServiceType::Shared);
        assert_eq!(ServiceType::from_label(Some("Private transfer")), ServiceType::Shared);
        assert_eq!(ServiceType::from_label(None), ServiceType::Shared);
    }

    #[test]
    fn test_vehicle_seat_fallback() {
        let mut pkg = Package::new(PackageKind::Transfer, "t1", ServiceType::Private, 30000)
            .with_limits(None, Some(10));
        assert_eq!(pkg.vehicle_seats(), Some(10));

        pkg.seat_capacity = Some(7);
        assert_eq!(pkg.vehicle_seats(), Some(7));

        pkg.vehicle = Some(Vehicle { name: "Van".to_string(), seats: 0, units: 1 });
        assert_eq!(pkg.vehicle_seats(), Some(7));
    }
}
