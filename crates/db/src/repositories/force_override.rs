use crate::models::DbForceOverride;
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn get_force_override(
    pool: &Pool<Postgres>,
    modality_id: Uuid,
    user_id: Uuid,
) -> Result<Option<DbForceOverride>> {
    let force_override = sqlx::query_as::<_, DbForceOverride>(
        r#"
        SELECT id, modality_id, user_id, is_able_to_force, start_time, end_time, number_of_patients
        FROM modality_force_overrides
        WHERE modality_id = $1 AND user_id = $2
        "#,
    )
    .bind(modality_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(force_override)
}
