use crate::models::{DbModalitySchedule, weekday_to_db};
use chrono::{Datelike, NaiveDate};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Active shift definitions of a modality. With a date, only those that may
/// apply on it: recurring rows for its weekday and rows pinned to the date.
pub async fn get_schedules_for_modality(
    pool: &Pool<Postgres>,
    modality_id: Uuid,
    date: Option<NaiveDate>,
) -> Result<Vec<DbModalitySchedule>> {
    let schedules = sqlx::query_as::<_, DbModalitySchedule>(
        r#"
        SELECT id, modality_id, day_of_week, date, shift_period, start_time, end_time,
               patients_per_shift, is_active
        FROM modality_schedules
        WHERE modality_id = $1
          AND is_active
          AND ($2::date IS NULL OR date = $2 OR (date IS NULL AND day_of_week = $3))
        ORDER BY shift_period ASC, start_time ASC
        "#,
    )
    .bind(modality_id)
    .bind(date)
    .bind(date.map(|d| weekday_to_db(d.weekday())))
    .fetch_all(pool)
    .await?;

    Ok(schedules)
}
