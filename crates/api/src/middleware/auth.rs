//! # Caller identity
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! user in `x-user-id` and their role in `x-user-role`; this module turns
//! those headers into an [`Actor`].

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use modsched_core::errors::ScheduleError;
use modsched_core::models::appointment::Actor;
use uuid::Uuid;

use super::error_handling::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Extractor for the user performing a request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, USER_ID_HEADER)
            .ok_or_else(|| {
                AppError(ScheduleError::Validation {
                    field: USER_ID_HEADER,
                    reason: "missing caller identity".to_string(),
                })
            })?
            .trim()
            .parse::<Uuid>()
            .map_err(|e| {
                AppError(ScheduleError::Validation {
                    field: USER_ID_HEADER,
                    reason: e.to_string(),
                })
            })?;

        let is_admin = header(parts, USER_ROLE_HEADER)
            .is_some_and(|role| role.trim().eq_ignore_ascii_case("admin"));

        Ok(CurrentActor(Actor { user_id, is_admin }))
    }
}
