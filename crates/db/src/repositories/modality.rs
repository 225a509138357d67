use crate::models::DbModality;
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

pub async fn get_modality_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbModality>> {
    tracing::debug!("Getting modality by id: {}", id);

    let modality = sqlx::query_as::<_, DbModality>(
        r#"
        SELECT id, name, slot_type, slot_duration_minutes, max_bookable_days, is_active, created_at
        FROM modalities
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(modality)
}

/// Take the row lock that serializes bookings on one modality until the
/// surrounding transaction ends. Returns its current slot type, or `None` if
/// the modality is missing.
pub async fn lock_modality(conn: &mut PgConnection, id: Uuid) -> Result<Option<String>> {
    let slot_type = sqlx::query_scalar::<_, String>(
        r#"
        SELECT slot_type
        FROM modalities
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(slot_type)
}

/// Whether any appointment on the modality is not soft-deleted, canceled ones
/// included.
pub async fn has_live_appointments(conn: &mut PgConnection, id: Uuid) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM appointments
            WHERE modality_id = $1 AND deleted_at IS NULL
        )
        "#,
    )
    .bind(id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

pub async fn update_slot_type(
    conn: &mut PgConnection,
    id: Uuid,
    slot_type: &str,
) -> Result<Option<DbModality>> {
    tracing::debug!("Setting slot type of modality {} to {}", id, slot_type);

    let modality = sqlx::query_as::<_, DbModality>(
        r#"
        UPDATE modalities
        SET slot_type = $2
        WHERE id = $1
        RETURNING id, name, slot_type, slot_duration_minutes, max_bookable_days, is_active, created_at
        "#,
    )
    .bind(id)
    .bind(slot_type)
    .fetch_optional(conn)
    .await?;

    Ok(modality)
}
