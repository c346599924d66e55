pub mod app_config;
pub mod http_client;
pub mod memory_repo;

pub use app_config::Config;
pub use http_client::{HttpAvailabilityClient, StoreError};
pub use memory_repo::InMemoryAvailability;
