//! # Modality Handlers
//!
//! Read-side endpoints of a modality (working, booked and next available
//! slots), the force-booking check and the slot type switch.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use modsched_core::{
    errors::ScheduleError,
    models::{
        availability::{BookedSlots, CheckAvailabilityQuery, CheckAvailabilityResponse, WorkingSlots},
        force_override::ForceAbilityResponse,
        resource::{ChangeSlotTypeRequest, Resource},
    },
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiState, middleware::error_handling::AppError};

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

/// Query string of the availability endpoint
///
/// `excluded_dates` is a comma-separated list of `YYYY-MM-DD` dates.
#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityParams {
    pub date: Option<NaiveDate>,
    pub days_from_now: Option<u32>,
    pub duration_days: Option<u32>,
    pub range_limit: Option<u32>,
    pub excluded_dates: Option<String>,
}

impl AvailabilityParams {
    pub fn into_query(self) -> Result<CheckAvailabilityQuery, ScheduleError> {
        let excluded_dates = self
            .excluded_dates
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| ScheduleError::Validation {
                    field: "excluded_dates",
                    reason: format!("{s}: {e}"),
                })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(CheckAvailabilityQuery {
            date: self.date,
            days_from_now: self.days_from_now,
            duration_days: self.duration_days,
            range_limit: self.range_limit,
            excluded_dates,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ForceAbilityQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkingSlotsResponse {
    pub modality_id: Uuid,
    pub date: NaiveDate,
    pub working_slots: WorkingSlots,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BookedSlotsResponse {
    pub modality_id: Uuid,
    pub date: NaiveDate,
    pub booked: BookedSlots,
}

#[axum::debug_handler]
pub async fn get_working_slots(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<WorkingSlotsResponse>, AppError> {
    let working_slots = state.scheduler.get_working_slots(id, query.date).await?;

    Ok(Json(WorkingSlotsResponse {
        modality_id: id,
        date: query.date,
        working_slots,
    }))
}

#[axum::debug_handler]
pub async fn get_booked_slots(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DateQuery>,
) -> Result<Json<BookedSlotsResponse>, AppError> {
    let booked = state.scheduler.get_booked_slots(id, query.date).await?;

    Ok(Json(BookedSlotsResponse {
        modality_id: id,
        date: query.date,
        booked,
    }))
}

/// Finds the next date with an opening
///
/// ```text
/// GET /api/modalities/:id/availability?date=2024-06-10&duration_days=2&excluded_dates=2024-06-13
/// ```
///
/// Responds with `{"next_available": null}` when nothing is free within the
/// search horizon.
#[axum::debug_handler]
pub async fn check_availability(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Query(params): Query<AvailabilityParams>,
) -> Result<Json<CheckAvailabilityResponse>, AppError> {
    let query = params.into_query()?;
    let next_available = state.scheduler.check_availability(id, &query).await?;

    Ok(Json(CheckAvailabilityResponse { next_available }))
}

#[axum::debug_handler]
pub async fn get_force_ability(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ForceAbilityQuery>,
) -> Result<Json<ForceAbilityResponse>, AppError> {
    let is_able_to_force = state.scheduler.get_force_ability(id, query.user_id).await?;

    Ok(Json(ForceAbilityResponse {
        modality_id: id,
        user_id: query.user_id,
        is_able_to_force,
    }))
}

#[axum::debug_handler]
pub async fn change_slot_type(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeSlotTypeRequest>,
) -> Result<Json<Resource>, AppError> {
    let resource = state.scheduler.change_slot_type(id, payload.slot_type).await?;
    Ok(Json(resource))
}
