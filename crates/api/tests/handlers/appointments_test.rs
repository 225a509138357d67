use axum::http::StatusCode;
use modsched_core::models::appointment::{Appointment, AppointmentStatus};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor, date, staff, time};

fn slot_body(modality_id: Uuid, day: &str, at: &str) -> Value {
    json!({
        "modality_id": modality_id,
        "patient_id": Uuid::new_v4(),
        "date": day,
        "time": at,
    })
}

async fn book_monday_nine(ctx: &TestContext) -> Appointment {
    let modality = ctx.minutes_modality().await;
    let response = as_actor(ctx.server.post("/api/appointments"), &staff())
        .json(&slot_body(modality.id, "2024-06-03", "09:00:00"))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Appointment>()
}

#[tokio::test]
async fn test_book_appointment_returns_created() {
    let ctx = TestContext::new();
    let appointment = book_monday_nine(&ctx).await;

    assert_eq!(appointment.date, date("2024-06-03"));
    assert_eq!(appointment.time, Some(time("09:00")));
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
}

#[tokio::test]
async fn test_double_booking_is_a_conflict() {
    let ctx = TestContext::new();
    let first = book_monday_nine(&ctx).await;

    let response = as_actor(ctx.server.post("/api/appointments"), &staff())
        .json(&slot_body(first.resource_id, "2024-06-03", "09:00:00"))
        .await;

    assert_eq!(response.status_code(), StatusCode::CONFLICT);
    let body = response.json::<Value>();
    assert_eq!(body["code"], "slot_unavailable");
    assert_eq!(body["field"], "time");
}

#[tokio::test]
async fn test_friday_start_is_unprocessable() {
    let ctx = TestContext::new();
    let modality = ctx.days_modality(3).await;

    let response = as_actor(ctx.server.post("/api/appointments"), &staff())
        .json(&json!({
            "modality_id": modality.id,
            "patient_id": Uuid::new_v4(),
            "date": "2024-06-07",
            "duration_days": 1,
        }))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["code"], "friday_not_bookable");
}

#[tokio::test]
async fn test_missing_caller_is_a_bad_request() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;

    let response = ctx
        .server
        .post("/api/appointments")
        .json(&slot_body(modality.id, "2024-06-03", "09:00:00"))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["field"], "x-user-id");
    assert!(ctx.store.all_appointments().await.is_empty());
}

#[tokio::test]
async fn test_force_requires_a_grant() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;
    // Tuesday has no shift, so only a forced booking can land there
    let mut body = slot_body(modality.id, "2024-06-04", "13:00:00");
    body["force"] = json!(true);

    let caller = staff();
    let denied = as_actor(ctx.server.post("/api/appointments"), &caller)
        .json(&body)
        .await;
    assert_eq!(denied.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(denied.json::<Value>()["code"], "force_permission_denied");

    ctx.grant_force(&modality, &caller).await;
    let forced = as_actor(ctx.server.post("/api/appointments"), &caller)
        .json(&body)
        .await;
    assert_eq!(forced.status_code(), StatusCode::CREATED);
    assert_eq!(forced.json::<Appointment>().time, Some(time("13:00")));
}

#[tokio::test]
async fn test_update_moves_the_appointment() {
    let ctx = TestContext::new();
    let booked = book_monday_nine(&ctx).await;

    let response = as_actor(
        ctx.server.put(&format!("/api/appointments/{}", booked.id)),
        &staff(),
    )
    .json(&json!({ "date": "2024-06-03", "time": "10:30:00" }))
    .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let moved = response.json::<Appointment>();
    assert_eq!(moved.id, booked.id);
    assert_eq!(moved.time, Some(time("10:30")));
}

#[tokio::test]
async fn test_cancel_is_idempotent_and_blocks_advance() {
    let ctx = TestContext::new();
    let booked = book_monday_nine(&ctx).await;
    let cancel_path = format!("/api/appointments/{}/cancel", booked.id);

    let first = as_actor(ctx.server.post(&cancel_path), &staff())
        .json(&json!({ "reason": "patient unwell" }))
        .await;
    assert_eq!(first.status_code(), StatusCode::OK);
    let canceled = first.json::<Appointment>();
    assert_eq!(canceled.status, AppointmentStatus::Canceled);
    assert_eq!(canceled.reason.as_deref(), Some("patient unwell"));

    let again = as_actor(ctx.server.post(&cancel_path), &staff()).await;
    assert_eq!(again.status_code(), StatusCode::OK);
    assert_eq!(again.json::<Appointment>().canceled_at, canceled.canceled_at);

    let advance = as_actor(
        ctx.server.post(&format!("/api/appointments/{}/advance", booked.id)),
        &staff(),
    )
    .await;
    assert_eq!(advance.status_code(), StatusCode::CONFLICT);
    assert_eq!(advance.json::<Value>()["code"], "invalid_status_transition");
}

#[tokio::test]
async fn test_advance_marks_done() {
    let ctx = TestContext::new();
    let booked = book_monday_nine(&ctx).await;

    let response = as_actor(
        ctx.server.post(&format!("/api/appointments/{}/advance", booked.id)),
        &staff(),
    )
    .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Appointment>().status, AppointmentStatus::Done);
}

#[tokio::test]
async fn test_removed_appointment_is_gone() {
    let ctx = TestContext::new();
    let booked = book_monday_nine(&ctx).await;
    let path = format!("/api/appointments/{}", booked.id);

    let removed = as_actor(ctx.server.delete(&path), &staff()).await;
    assert_eq!(removed.status_code(), StatusCode::OK);
    assert!(removed.json::<Appointment>().deleted_at.is_some());

    let update = as_actor(ctx.server.put(&path), &staff())
        .json(&json!({ "date": "2024-06-03", "time": "10:00:00" }))
        .await;
    assert_eq!(update.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(update.json::<Value>()["code"], "appointment_not_found");

    // The slot is free again
    let rebooked = as_actor(ctx.server.post("/api/appointments"), &staff())
        .json(&slot_body(booked.resource_id, "2024-06-03", "09:00:00"))
        .await;
    assert_eq!(rebooked.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_rebook_without_canceled_booking_is_not_found() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;
    let mut body = slot_body(modality.id, "2024-06-03", "09:00:00");
    body["rebook_canceled"] = json!(true);

    let response = as_actor(ctx.server.post("/api/appointments"), &staff())
        .json(&body)
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "no_canceled_appointment_found");
}
