use axum::{
    Router,
    routing::{get, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/modalities/:id/working-slots",
            get(handlers::modalities::get_working_slots),
        )
        .route(
            "/api/modalities/:id/booked-slots",
            get(handlers::modalities::get_booked_slots),
        )
        .route(
            "/api/modalities/:id/availability",
            get(handlers::modalities::check_availability),
        )
        .route(
            "/api/modalities/:id/force-ability",
            get(handlers::modalities::get_force_ability),
        )
        .route(
            "/api/modalities/:id/slot-type",
            put(handlers::modalities::change_slot_type),
        )
}
