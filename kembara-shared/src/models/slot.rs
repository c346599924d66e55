use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which booking flow a package belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Tour,
    Transfer,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageKind::Tour => "tour",
            PackageKind::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tour" | "tours" => Ok(PackageKind::Tour),
            "transfer" | "transfers" => Ok(PackageKind::Transfer),
            other => Err(format!("unknown package type: {}", other)),
        }
    }
}

/// A bookable date+time offering of a package, as reported by the
/// availability service. Read-only on this side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    /// "HH:MM", unique within a package and date
    pub time: String,

    /// Seats for shared packages, vehicle units for private ones
    #[serde(default)]
    pub capacity: u32,

    #[serde(default)]
    pub booked_count: u32,

    #[serde(default)]
    pub is_available: bool,

    /// Stored minimum party size. The backend moves it after the first booking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_person: Option<u32>,

    /// Effective minimum for validation (tour flow only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_minimum: Option<u32>,
}

impl TimeSlot {
    pub fn new(time: &str, capacity: u32, booked_count: u32) -> Self {
        Self {
            time: time.to_string(),
            capacity,
            booked_count,
            is_available: true,
            minimum_person: None,
            current_minimum: None,
        }
    }

    pub fn with_minimum(mut self, minimum_person: u32) -> Self {
        self.minimum_person = Some(minimum_person);
        self
    }

    pub fn with_current_minimum(mut self, current_minimum: u32) -> Self {
        self.current_minimum = Some(current_minimum);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.is_available = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_deserialization() {
        let json = r#"
            {
                "time": "09:00",
                "capacity": 10,
                "bookedCount": 4,
                "isAvailable": true,
                "minimumPerson": 4,
                "currentMinimum": 1
            }
        "#;
        let slot: TimeSlot = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(slot.time, "09:00");
        assert_eq!(slot.booked_count, 4);
        assert_eq!(slot.minimum_person, Some(4));
        assert_eq!(slot.current_minimum, Some(1));
    }

    #[test]
    fn test_transfer_slot_without_current_minimum() {
        let json = r#"{ "time": "14:30", "capacity": 12, "bookedCount": 0, "isAvailable": false, "minimumPerson": 2 }"#;
        let slot: TimeSlot = serde_json::from_str(json).unwrap();
        assert!(!slot.is_available);
        assert_eq!(slot.current_minimum, None);
    }

    #[test]
    fn test_package_kind_parsing() {
        assert_eq!("tour".parse::<PackageKind>().unwrap(), PackageKind::Tour);
        assert_eq!("Transfers".parse::<PackageKind>().unwrap(), PackageKind::Transfer);
        assert!("cruise".parse::<PackageKind>().is_err());
        assert_eq!(serde_json::to_string(&PackageKind::Transfer).unwrap(), "\"transfer\"");
    }
}
