use std::time::Duration;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};
use kembara_catalog::{sen_from_major, Package, ServiceType, Vehicle};
use kembara_core::{AvailabilityService, CoreError, CoreResult, ServerClock};
use kembara_shared::{PackageKind, TimeSlot};
use crate::app_config::UpstreamConfig;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream rejected request: {0}")]
    Upstream(String),

    #[error("Malformed upstream payload: {0}")]
    Decode(String),

    #[error("Invalid upstream base URL {0}")]
    BaseUrl(String),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Decode(msg) => CoreError::DecodeError(msg),
            other => CoreError::UpstreamError(other.to_string()),
        }
    }
}

/// `{ success, data, message }` wrapper used by every backend route
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Value,
    message: Option<String>,
}

impl Envelope {
    fn into_data(self) -> Result<Value, StoreError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(StoreError::Upstream(self.message.unwrap_or_else(|| "request unsuccessful".to_string())))
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Slot list from an envelope payload. Anything but an array is empty.
fn decode_slots(data: Value) -> Result<Vec<TimeSlot>, StoreError> {
    match data {
        Value::Array(_) => decode(data),
        _ => Ok(Vec::new()),
    }
}

/// Tour or transfer record as the backend returns it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamPackage {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type")]
    type_label: Option<String>,
    #[serde(default)]
    new_price: f64,
    #[serde(default)]
    child_price: f64,
    minimum_person: Option<u32>,
    maximum_person: Option<u32>,
    seat_capacity: Option<u32>,
    duration: Option<String>,
    #[serde(default)]
    vehicle: Value,
}

impl UpstreamPackage {
    fn into_package(self, kind: PackageKind) -> Package {
        let service = ServiceType::from_label(self.type_label.as_deref());
        let slug = if self.slug.is_empty() { self.id.clone() } else { self.slug };
        let title = if self.title.is_empty() { slug.clone() } else { self.title };

        Package {
            id: self.id,
            slug,
            title,
            kind,
            service,
            type_label: self.type_label,
            new_price_sen: sen_from_major(self.new_price),
            child_price_sen: sen_from_major(self.child_price),
            minimum_person: self.minimum_person.filter(|n| *n > 0),
            maximum_person: self.maximum_person.filter(|n| *n > 0),
            vehicle: None,
            seat_capacity: self.seat_capacity,
            duration: self.duration,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpstreamVehicle {
    #[serde(rename = "_id", default)]
    id: String,
    #[serde(default)]
    name: String,
    seats: Option<u32>,
    seat_capacity: Option<u32>,
    units: Option<u32>,
}

impl UpstreamVehicle {
    fn into_vehicle(self) -> Option<Vehicle> {
        if self.name.is_empty() {
            return None;
        }
        Some(Vehicle {
            name: self.name,
            seats: self.seats.filter(|n| *n > 0).or(self.seat_capacity).unwrap_or(0),
            units: self.units.filter(|n| *n > 0).unwrap_or(1),
        })
    }
}

/// Vehicle reference on a tour record: an id, a name, or an embedded object
fn vehicle_reference(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(map) => map
            .get("_id")
            .or_else(|| map.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

fn is_object_id(s: &str) -> bool {
    s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// `AvailabilityService` over the booking backend's REST API
pub struct HttpAvailabilityClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAvailabilityClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let base_url = Url::parse(&config.base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| StoreError::BaseUrl(config.base_url.clone()))?;

        Ok(Self { client, base_url })
    }

    /// Base URL extended by `segments`, each percent-encoded as one segment
    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::BaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Value, StoreError> {
        let url = self.url(segments)?;
        debug!("GET {}", url);

        let envelope: Envelope = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .json()
            .await?;

        envelope.into_data()
    }

    /// Id lookup when the reference looks like an id, then a scan of the
    /// vehicle list by name or id. `None` when neither resolves.
    async fn resolve_vehicle(&self, reference: &str) -> Option<Vehicle> {
        if is_object_id(reference) {
            match self.get(&["api", "vehicles", reference], &[]).await.and_then(decode::<UpstreamVehicle>) {
                Ok(v) => {
                    if let Some(vehicle) = v.into_vehicle() {
                        return Some(vehicle);
                    }
                }
                Err(e) => warn!("Vehicle ID lookup failed for {}: {}", reference, e),
            }
        }

        match self.get(&["api", "vehicles"], &[]).await.and_then(decode::<Vec<UpstreamVehicle>>) {
            Ok(list) => list
                .into_iter()
                .find(|v| v.name == reference || v.id == reference)
                .and_then(UpstreamVehicle::into_vehicle),
            Err(e) => {
                warn!("Vehicle list lookup failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl AvailabilityService for HttpAvailabilityClient {
    async fn available_slots(
        &self,
        kind: PackageKind,
        package_id: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<TimeSlot>> {
        let date = date.format("%Y-%m-%d").to_string();
        let data = self
            .get(
                &["api", "timeslots", "available"],
                &[("packageType", kind.as_str()), ("packageId", package_id), ("date", &date)],
            )
            .await?;

        Ok(decode_slots(data)?)
    }

    async fn server_clock(&self) -> CoreResult<ServerClock> {
        let data = self.get(&["api", "timeslots", "server-datetime"], &[]).await?;
        Ok(decode(data)?)
    }

    async fn package_by_slug(&self, kind: PackageKind, slug: &str) -> CoreResult<Option<Package>> {
        let collection = match kind {
            PackageKind::Tour => "tours",
            PackageKind::Transfer => "transfers",
        };

        let data = match self.get(&["api", collection, "slug", slug], &[]).await {
            Ok(Value::Null) => return Ok(None),
            Ok(data) => data,
            Err(StoreError::Upstream(msg)) => {
                debug!("{} {} not found upstream: {}", kind, slug, msg);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let record: UpstreamPackage = decode(data)?;
        let reference = vehicle_reference(&record.vehicle);
        let mut package = record.into_package(kind);

        if package.is_vehicle_booking() && kind == PackageKind::Tour {
            if let Some(reference) = reference {
                package.vehicle = self.resolve_vehicle(&reference).await;
                if package.vehicle.is_none() {
                    warn!("Could not resolve vehicle {} for tour {}", reference, package.id);
                }
            }
        }

        Ok(Some(package))
    }
}
