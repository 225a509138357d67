use axum::http::StatusCode;
use modsched_api::handlers::modalities::{BookedSlotsResponse, WorkingSlotsResponse};
use modsched_core::models::availability::{
    BookedSlots, CheckAvailabilityResponse, PeriodLabel, WorkingSlots,
};
use modsched_core::models::force_override::ForceAbilityResponse;
use modsched_core::models::resource::{Resource, SlotType};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::test_utils::{TestContext, as_actor, date, staff, time};

async fn book(ctx: &TestContext, modality_id: Uuid, body: Value) {
    let mut body = body;
    body["modality_id"] = json!(modality_id);
    body["patient_id"] = json!(Uuid::new_v4());
    let response = as_actor(ctx.server.post("/api/appointments"), &staff())
        .json(&body)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_working_slots_follow_the_shift() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;

    let response = ctx
        .server
        .get(&format!(
            "/api/modalities/{}/working-slots?date=2024-06-03",
            modality.id
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.json::<WorkingSlotsResponse>();
    assert_eq!(body.modality_id, modality.id);
    let times = body.working_slots.times();
    assert_eq!(times.first(), Some(&time("09:00")));
    assert!(times.contains(&time("11:30")));
    assert!(!times.contains(&time("12:00")));
}

#[tokio::test]
async fn test_days_modality_reports_fridays_closed() {
    let ctx = TestContext::new();
    let modality = ctx.days_modality(3).await;

    let response = ctx
        .server
        .get(&format!(
            "/api/modalities/{}/working-slots?date=2024-06-07",
            modality.id
        ))
        .await;

    assert_eq!(
        response.json::<WorkingSlotsResponse>().working_slots,
        WorkingSlots::Closed
    );
}

#[tokio::test]
async fn test_booked_slots_list_taken_times() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;
    book(&ctx, modality.id, json!({ "date": "2024-06-03", "time": "09:30:00" })).await;

    let response = ctx
        .server
        .get(&format!(
            "/api/modalities/{}/booked-slots?date=2024-06-03",
            modality.id
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let BookedSlots::Times(times) = response.json::<BookedSlotsResponse>().booked else {
        panic!("minutes modality should report booked times");
    };
    assert_eq!(times.into_iter().collect::<Vec<_>>(), vec![time("09:30")]);
}

#[tokio::test]
async fn test_days_period_marks_every_covered_day() {
    let ctx = TestContext::new();
    let modality = ctx.days_modality(3).await;
    book(&ctx, modality.id, json!({ "date": "2024-06-13", "duration_days": 3 })).await;

    for day in ["2024-06-13", "2024-06-14", "2024-06-15"] {
        let response = ctx
            .server
            .get(&format!(
                "/api/modalities/{}/booked-slots?date={}",
                modality.id, day
            ))
            .await;
        assert_eq!(
            response.json::<BookedSlotsResponse>().booked,
            BookedSlots::FullDayBooked,
            "{day} should be covered"
        );
    }
}

#[tokio::test]
async fn test_availability_skips_a_full_morning() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;
    for at in ["09:00:00", "09:30:00", "10:00:00", "10:30:00", "11:00:00", "11:30:00"] {
        book(&ctx, modality.id, json!({ "date": "2024-06-03", "time": at })).await;
    }

    let response = ctx
        .server
        .get(&format!(
            "/api/modalities/{}/availability?date=2024-06-03",
            modality.id
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let next = response
        .json::<CheckAvailabilityResponse>()
        .next_available
        .expect("an opening within the horizon");
    assert_eq!(next.date, date("2024-06-10"));
    assert_eq!(next.period, PeriodLabel::Morning);
    assert_eq!(next.slots.first(), Some(&time("09:00")));
}

#[tokio::test]
async fn test_availability_rejects_malformed_excluded_dates() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;

    let response = ctx
        .server
        .get(&format!(
            "/api/modalities/{}/availability?excluded_dates=next-week",
            modality.id
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["field"], "excluded_dates");
}

#[tokio::test]
async fn test_unknown_modality_is_not_found() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .get(&format!(
            "/api/modalities/{}/working-slots?date=2024-06-03",
            Uuid::new_v4()
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["code"], "resource_not_found");
}

#[tokio::test]
async fn test_force_ability_reflects_grants() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;
    let granted = staff();
    ctx.grant_force(&modality, &granted).await;

    for (user, expected) in [(granted.user_id, true), (Uuid::new_v4(), false)] {
        let response = ctx
            .server
            .get(&format!(
                "/api/modalities/{}/force-ability?user_id={}",
                modality.id, user
            ))
            .await;
        let body = response.json::<ForceAbilityResponse>();
        assert_eq!(body.user_id, user);
        assert_eq!(body.is_able_to_force, expected);
    }
}

#[tokio::test]
async fn test_slot_type_change_is_locked_once_booked() {
    let ctx = TestContext::new();
    let modality = ctx.minutes_modality().await;
    let path = format!("/api/modalities/{}/slot-type", modality.id);

    let switched = ctx.server.put(&path).json(&json!({ "slot_type": "days" })).await;
    assert_eq!(switched.status_code(), StatusCode::OK);
    assert_eq!(switched.json::<Resource>().slot_type, SlotType::Days);

    let back = ctx
        .server
        .put(&path)
        .json(&json!({ "slot_type": "minutes" }))
        .await;
    assert_eq!(back.status_code(), StatusCode::OK);

    book(&ctx, modality.id, json!({ "date": "2024-06-03", "time": "09:00:00" })).await;
    let locked = ctx.server.put(&path).json(&json!({ "slot_type": "days" })).await;
    assert_eq!(locked.status_code(), StatusCode::CONFLICT);
    assert_eq!(locked.json::<Value>()["code"], "slot_type_locked");
}
