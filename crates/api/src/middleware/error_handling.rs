//! # Error Handling Middleware
//!
//! Maps scheduling errors to HTTP status codes and a uniform JSON body:
//!
//! ```json
//! { "error": "Fridays are not bookable: 2024-06-14", "code": "friday_not_bookable", "field": "date" }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use modsched_core::errors::ScheduleError;
use serde_json::json;
use tracing::error;

/// Application error wrapper that provides HTTP status code mapping
///
/// Handlers return `Result<_, AppError>` and use `?` on any
/// `ScheduleResult`.
#[derive(Debug)]
pub struct AppError(pub ScheduleError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ScheduleError::ResourceNotFound(_)
            | ScheduleError::AppointmentNotFound(_)
            | ScheduleError::NoCanceledAppointmentFound { .. } => StatusCode::NOT_FOUND,
            ScheduleError::SlotUnavailable { .. }
            | ScheduleError::SlotTypeLocked(_)
            | ScheduleError::InvalidStatusTransition { .. } => StatusCode::CONFLICT,
            ScheduleError::FridayNotBookable { .. }
            | ScheduleError::DurationNotAllowed { .. }
            | ScheduleError::PastDate { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ScheduleError::ForcePermissionDenied => StatusCode::FORBIDDEN,
            ScheduleError::Validation { .. } => StatusCode::BAD_REQUEST,
            ScheduleError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage failures are logged in full but not echoed to the caller
        let message = match &self.0 {
            ScheduleError::Database(report) => {
                error!("Storage failure: {:?}", report);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "code": self.0.code(),
            "field": self.0.field(),
        }));

        (status, body).into_response()
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        AppError(err)
    }
}

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(ScheduleError::Database(err))
    }
}

/// Maps a ScheduleError straight to an HTTP response
pub fn map_error(err: ScheduleError) -> Response {
    AppError(err).into_response()
}
