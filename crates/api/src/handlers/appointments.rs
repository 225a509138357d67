use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use modsched_core::models::appointment::{
    Appointment, BookAppointmentRequest, CancelAppointmentRequest, UpdateAppointmentRequest,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::{
    ApiState,
    middleware::{auth::CurrentActor, error_handling::AppError},
};

/// Books a slot or a day range
///
/// With `rebook_canceled` set, the canceled booking starting on `date` is
/// brought back instead and `time`/`duration_days` are taken from it.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    debug!(
        "Booking request on modality {} for {} by {}",
        payload.modality_id, payload.date, actor.user_id
    );
    let appointment = state.scheduler.book(payload, actor).await?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.scheduler.update(id, payload, actor).await?;
    Ok(Json(appointment))
}

/// Cancels an appointment; the body and its reason are optional
#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    payload: Option<Json<CancelAppointmentRequest>>,
) -> Result<Json<Appointment>, AppError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    let appointment = state.scheduler.cancel(id, reason, actor).await?;

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn advance_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.scheduler.advance(id, Some(actor)).await?;
    Ok(Json(appointment))
}

/// Soft-deletes an appointment; it stops occupying its slot
#[axum::debug_handler]
pub async fn remove_appointment(
    State(state): State<Arc<ApiState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = state.scheduler.remove(id, actor).await?;
    Ok(Json(appointment))
}
