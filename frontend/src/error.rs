//! # Error Types
//!
//! Errors surfaced by the booking flow, split by where they originate:
//!
//! - [`ValidationError`]: a required selection is missing or not allowed.
//!   Never reaches the network layer.
//! - [`ApiError`]: anything that went wrong talking to the remote API.
//! - [`SubmitError`]: the outcome of a failed confirmation, carrying the
//!   exact text shown next to the confirm button.
//! - [`ConfigError`]: the client configuration could not be loaded.

use std::path::PathBuf;

use chrono::NaiveDate;
use reqwest::StatusCode;
use thiserror::Error;

/// Message shown when a booking fails and the server gave no explanation
pub const GENERIC_BOOKING_FAILURE: &str = "Could not create the booking. Please try again.";

/// Why a calendar day cannot be picked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnselectableReason {
    Past,
    Weekend,
    OutsideMonth,
}

/// A missing or invalid selection, reported inline and never sent to the API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a professional.")]
    MissingProfessional,

    #[error("Please select a date.")]
    MissingDate,

    #[error("Please select a time.")]
    MissingTime,

    #[error("Please select a payment method.")]
    MissingPaymentMethod,

    #[error("Your session has expired. Please sign in again.")]
    MissingSession,

    #[error("{date} cannot be booked ({reason:?}).")]
    DayNotSelectable {
        date: NaiveDate,
        reason: UnselectableReason,
    },

    #[error("{0} is no longer available.")]
    SlotNotBookable(String),

    #[error("{0} is not one of the offered times.")]
    SlotNotInCatalog(String),

    #[error("Professional {0} is not in the list.")]
    ProfessionalNotFound(i64),
}

/// Failure talking to the remote API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Server error {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Server {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// The message the server sent back, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Why a confirmation did not produce a booking
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("A booking request is already being processed.")]
    InFlight,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SubmitError {
    /// Text to show the user: the server's own message when it sent one,
    /// otherwise a generic failure message
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Validation(err) => err.to_string(),
            SubmitError::InFlight => self.to_string(),
            SubmitError::Api(err) => err
                .server_message()
                .map(str::to_string)
                .unwrap_or_else(|| GENERIC_BOOKING_FAILURE.to_string()),
        }
    }
}

/// Client configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_error_prefers_server_message() {
        let err = SubmitError::Api(ApiError::Server {
            status: StatusCode::CONFLICT,
            message: Some("Slot already booked".to_string()),
        });
        assert_eq!(err.user_message(), "Slot already booked");
    }

    #[test]
    fn test_submit_error_falls_back_to_generic_message() {
        let err = SubmitError::Api(ApiError::Server {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        });
        assert_eq!(err.user_message(), GENERIC_BOOKING_FAILURE);

        let err = SubmitError::Api(ApiError::InvalidResponse("truncated body".to_string()));
        assert_eq!(err.user_message(), GENERIC_BOOKING_FAILURE);
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            SubmitError::from(ValidationError::MissingProfessional).user_message(),
            "Please select a professional."
        );
        assert_eq!(ValidationError::MissingDate.to_string(), "Please select a date.");
        assert_eq!(ValidationError::MissingTime.to_string(), "Please select a time.");
    }
}
