use axum::{
    Router,
    routing::{post, put},
};
use std::sync::Arc;

use crate::{ApiState, handlers};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/appointments",
            post(handlers::appointments::book_appointment),
        )
        .route(
            "/api/appointments/:id",
            put(handlers::appointments::update_appointment)
                .delete(handlers::appointments::remove_appointment),
        )
        .route(
            "/api/appointments/:id/cancel",
            post(handlers::appointments::cancel_appointment),
        )
        .route(
            "/api/appointments/:id/advance",
            post(handlers::appointments::advance_appointment),
        )
}
