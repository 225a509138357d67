use axum::http::StatusCode;
use chrono::NaiveDate;
use eyre::eyre;
use modsched_api::middleware::error_handling::map_error;
use modsched_core::errors::ScheduleError;
use modsched_core::models::appointment::AppointmentStatus;
use modsched_db::mock::repositories::MockStore;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::Value;
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor, server_with_store, staff};

fn friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
}

#[rstest]
#[case::missing_modality(ScheduleError::ResourceNotFound(Uuid::nil()), StatusCode::NOT_FOUND)]
#[case::missing_appointment(ScheduleError::AppointmentNotFound(Uuid::nil()), StatusCode::NOT_FOUND)]
#[case::nothing_to_rebook(
    ScheduleError::NoCanceledAppointmentFound { date: friday() },
    StatusCode::NOT_FOUND
)]
#[case::taken(
    ScheduleError::SlotUnavailable { date: friday(), time: None, reason: "taken".to_string() },
    StatusCode::CONFLICT
)]
#[case::locked(ScheduleError::SlotTypeLocked(Uuid::nil()), StatusCode::CONFLICT)]
#[case::transition(
    ScheduleError::InvalidStatusTransition {
        from: AppointmentStatus::Done,
        to: AppointmentStatus::Canceled,
    },
    StatusCode::CONFLICT
)]
#[case::friday(ScheduleError::FridayNotBookable { date: friday() }, StatusCode::UNPROCESSABLE_ENTITY)]
#[case::force(ScheduleError::ForcePermissionDenied, StatusCode::FORBIDDEN)]
#[case::validation(
    ScheduleError::Validation { field: "time", reason: "required".to_string() },
    StatusCode::BAD_REQUEST
)]
#[case::storage(ScheduleError::Database(eyre!("pool timed out")), StatusCode::INTERNAL_SERVER_ERROR)]
fn test_error_status_mapping(#[case] error: ScheduleError, #[case] expected: StatusCode) {
    assert_eq!(map_error(error).status(), expected);
}

#[test_log::test(tokio::test)]
async fn test_storage_failure_is_hidden_from_the_caller() {
    let mut store = MockStore::new();
    store
        .expect_get_resource()
        .times(1)
        .returning(|_| Err(eyre!("connection reset by peer")));
    let server = server_with_store(store);

    let response = server
        .get(&format!(
            "/api/modalities/{}/working-slots?date=2024-06-03",
            Uuid::new_v4()
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.json::<Value>();
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["code"], "database_error");
}

#[test_log::test(tokio::test)]
async fn test_malformed_user_id_header_is_rejected() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;

    let response = ctx
        .server
        .post("/api/appointments")
        .add_header(
            axum::http::HeaderName::from_static("x-user-id"),
            axum::http::HeaderValue::from_static("not-a-uuid"),
        )
        .json(&serde_json::json!({
            "modality_id": modality.id,
            "patient_id": Uuid::new_v4(),
            "date": "2024-06-03",
            "time": "09:00:00",
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["code"], "validation_error");
}

#[test_log::test(tokio::test)]
async fn test_admin_role_may_force_without_a_grant() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;
    let mut admin = staff();
    admin.is_admin = true;

    let response = as_actor(ctx.server.post("/api/appointments"), &admin)
        .json(&serde_json::json!({
            "modality_id": modality.id,
            "patient_id": Uuid::new_v4(),
            "date": "2024-06-04",
            "time": "08:00:00",
            "force": true,
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
}
