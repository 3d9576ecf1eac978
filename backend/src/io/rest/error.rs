//! Translation of domain errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};

use crate::domain::errors::{BookingError, ValidationError};
use shared::ErrorResponse;

#[derive(Debug)]
pub struct ApiError(pub BookingError);

impl ApiError {
    /// 400 for input the handler could not even turn into a command
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError(ValidationError::Malformed(message.into()).into())
    }

    pub fn status(&self) -> StatusCode {
        match &self.0 {
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
            BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BookingError::CapacityConflict { .. }
            | BookingError::StateTransition { .. }
            | BookingError::AlreadySettled { .. } => StatusCode::CONFLICT,
            BookingError::LateCancellation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::PaymentRequired { .. } | BookingError::InsufficientFunds { .. } => {
                StatusCode::PAYMENT_REQUIRED
            }
            BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self.0 {
            BookingError::Storage(e) => {
                error!("Storage failure while handling request: {}", e);
                "Internal storage error".to_string()
            }
            other => {
                warn!(code = other.code(), "Request rejected: {}", other);
                other.to_string()
            }
        };
        let body = ErrorResponse {
            code: self.0.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use shared::BookingStatus;

    #[test]
    fn test_status_mapping() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let cases = vec![
            (BookingError::from(ValidationError::EmptyPetSelection), StatusCode::BAD_REQUEST),
            (BookingError::CapacityConflict { date }, StatusCode::CONFLICT),
            (
                BookingError::StateTransition {
                    booking_id: "bk-1".to_string(),
                    from: BookingStatus::NoShow,
                    action: "accept",
                },
                StatusCode::CONFLICT,
            ),
            (
                BookingError::PaymentRequired {
                    booking_id: "bk-1".to_string(),
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                BookingError::InsufficientFunds {
                    required: dec!(339),
                    available: dec!(200),
                },
                StatusCode::PAYMENT_REQUIRED,
            ),
            (BookingError::not_found("Booking", "bk-1"), StatusCode::NOT_FOUND),
            (
                BookingError::PermissionDenied { action: "accept bookings" },
                StatusCode::FORBIDDEN,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn test_payment_required_and_validation_are_distinct() {
        let payment = ApiError(BookingError::PaymentRequired {
            booking_id: "bk-1".to_string(),
        });
        let validation = ApiError::bad_request("bad date");
        assert_ne!(payment.status(), validation.status());
        assert_ne!(payment.0.code(), validation.0.code());
    }
}
