pub mod availability;
pub mod calendar;

pub use availability::AvailabilityService;
pub use calendar::{find_next_available_date, minimum_booking_date, ServerClock, DEFAULT_LOOKAHEAD_DAYS};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Upstream request failed: {0}")]
    UpstreamError(String),
    #[error("Upstream returned malformed data: {0}")]
    DecodeError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
