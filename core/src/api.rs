//! The fixed set of REST endpoints the desk talks to.

use crate::model::{BookingLookup, BookingStatus, Configuration, Event, Person};
use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by [`ReceptionApi`] calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Base URL or credential missing; no request was sent
    #[error("API Config missing")]
    ConfigMissing,

    /// The server answered 404
    #[error("{message}")]
    NotFound {
        /// Server-provided message
        message: String,
    },

    /// The server answered with any other non-success status
    #[error("{message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Server-provided message, or a generic fallback
        message: String,
    },

    /// The request never produced a response
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body was not what the endpoint promises
    #[error("Response parsing failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether this error means "the resource does not exist".
    ///
    /// Some deployments answer a missing booking with a non-404 status and a
    /// "not found" message, so the message is checked too.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Server { message, .. } => message.to_lowercase().contains("not found"),
            _ => false,
        }
    }
}

/// Authenticated access to the reception API.
///
/// Implementations attach the bearer credential from the current
/// [`Configuration`], never retry, never cache, and fail with
/// [`ApiError::ConfigMissing`] before touching the network when the
/// configuration is incomplete.
#[async_trait]
pub trait ReceptionApi: Send + Sync {
    /// Replace the configuration used for subsequent calls.
    fn configure(&self, configuration: &Configuration);

    /// `GET /api/user/read?user_id={id}`
    async fn read_person(&self, person_id: &str) -> Result<Person, ApiError>;

    /// `GET /api/events/all`
    async fn list_events(&self) -> Result<Vec<Event>, ApiError>;

    /// `GET /api/events/bookings/status?event_id={e}&user_id={u}`
    async fn booking_status(
        &self,
        event_id: &str,
        person_id: &str,
    ) -> Result<BookingLookup, ApiError>;

    /// `POST /api/events/{eventId}/bookings`
    async fn create_booking(&self, event_id: &str, person_id: &str) -> Result<(), ApiError>;

    /// `POST /api/events/{eventId}/bookings/status`
    async fn update_booking_status(
        &self,
        event_id: &str,
        person_id: &str,
        status: &BookingStatus,
    ) -> Result<(), ApiError>;

    /// `POST /api/score/write`
    async fn write_score(
        &self,
        person_id: &str,
        score_change: i64,
        description: &str,
    ) -> Result<(), ApiError>;

    /// `POST /api/coin/write`
    async fn write_coin(
        &self,
        person_id: &str,
        coin_change: i64,
        description: &str,
    ) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_detection() {
        assert!(ApiError::NotFound { message: "gone".into() }.is_not_found());
        assert!(
            ApiError::Server { status: 400, message: "Booking Not Found".into() }.is_not_found()
        );
        assert!(!ApiError::Server { status: 500, message: "boom".into() }.is_not_found());
        assert!(!ApiError::ConfigMissing.is_not_found());
    }

    #[test]
    fn test_server_error_displays_message() {
        let err = ApiError::Server { status: 403, message: "Forbidden".into() };
        assert_eq!(err.to_string(), "Forbidden");
        assert_eq!(ApiError::ConfigMissing.to_string(), "API Config missing");
    }
}
