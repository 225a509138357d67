use crate::models::{DbAppointment, signed};
use chrono::{DateTime, NaiveDate, Utc};
use eyre::Result;
use modsched_core::filters::AppointmentFilter;
use modsched_core::models::appointment::{Appointment, AppointmentStatus};
use modsched_core::store::StatusChange;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

const COLUMNS: &str = "id, modality_id, patient_id, date, time, end_date, duration_days, status, \
    reason, created_by, updated_by, canceled_by, canceled_at, created_at, updated_at, deleted_at";

fn pg_date_bounds(from: NaiveDate, to: NaiveDate) -> (NaiveDate, NaiveDate) {
    let min = NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(from);
    let max = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(to);
    (from.clamp(min, max), to.clamp(min, max))
}

/// Live (not soft-deleted) appointments selected by `filter`, ordered by
/// date, time and creation.
pub async fn find_appointments<'e, E>(executor: E, filter: &AppointmentFilter) -> Result<Vec<DbAppointment>>
where
    E: Executor<'e, Database = Postgres>,
{
    let (from, to) = pg_date_bounds(filter.from, filter.to);
    let excluded: Vec<String> = filter
        .excluded_statuses
        .iter()
        .map(|s| s.as_str().to_string())
        .collect();

    let sql = format!(
        r#"
        SELECT {COLUMNS}
        FROM appointments
        WHERE modality_id = $1
          AND deleted_at IS NULL
          AND ($2::uuid IS NULL OR id <> $2)
          AND NOT (status = ANY($3))
          AND ($4::text IS NULL OR status = $4)
          AND CASE WHEN $5
                   THEN date BETWEEN $6 AND $7
                   ELSE date <= $7 AND COALESCE(end_date, date) >= $6
              END
        ORDER BY date ASC, time ASC NULLS FIRST, created_at ASC
        "#
    );

    let appointments = sqlx::query_as::<_, DbAppointment>(&sql)
        .bind(filter.resource_id)
        .bind(filter.exclude_id)
        .bind(excluded)
        .bind(filter.only_status.map(|s| s.as_str()))
        .bind(filter.starting_in_range)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;

    Ok(appointments)
}

/// Fetch one appointment, soft-deleted or not.
pub async fn get_appointment_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<DbAppointment>>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM appointments WHERE id = $1");
    let appointment = sqlx::query_as::<_, DbAppointment>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(appointment)
}

pub async fn insert_appointment<'e, E>(executor: E, appointment: &Appointment) -> Result<DbAppointment>
where
    E: Executor<'e, Database = Postgres>,
{
    tracing::debug!(
        "Inserting appointment: id={}, modality={}, date={}, time={:?}",
        appointment.id,
        appointment.resource_id,
        appointment.date,
        appointment.time
    );

    let sql = format!(
        r#"
        INSERT INTO appointments ({COLUMNS})
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, DbAppointment>(&sql)
        .bind(appointment.id)
        .bind(appointment.resource_id)
        .bind(appointment.patient_id)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(appointment.end_date)
        .bind(signed(appointment.duration_days, "duration_days")?)
        .bind(appointment.status.as_str())
        .bind(appointment.reason.as_deref())
        .bind(appointment.created_by)
        .bind(appointment.updated_by)
        .bind(appointment.canceled_by)
        .bind(appointment.canceled_at)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .bind(appointment.deleted_at)
        .fetch_one(executor)
        .await?;

    Ok(row)
}

/// Move a live row that is still in one of `movable`. Status, reason and
/// cancel columns are left alone.
pub async fn reschedule_appointment<'e, E>(
    executor: E,
    appointment: &Appointment,
    movable: &[AppointmentStatus],
) -> Result<Option<DbAppointment>>
where
    E: Executor<'e, Database = Postgres>,
{
    let movable: Vec<&str> = movable.iter().map(|s| s.as_str()).collect();
    let sql = format!(
        r#"
        UPDATE appointments
        SET date = $2,
            time = $3,
            end_date = $4,
            duration_days = $5,
            updated_by = $6,
            updated_at = $7
        WHERE id = $1
          AND deleted_at IS NULL
          AND status = ANY($8)
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, DbAppointment>(&sql)
        .bind(appointment.id)
        .bind(appointment.date)
        .bind(appointment.time)
        .bind(appointment.end_date)
        .bind(signed(appointment.duration_days, "duration_days")?)
        .bind(appointment.updated_by)
        .bind(appointment.updated_at)
        .bind(movable)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Compare-and-set on `status`. Returns `None` when the row is deleted or no
/// longer in `change.expected`.
pub async fn update_appointment_status<'e, E>(
    executor: E,
    change: &StatusChange,
) -> Result<Option<DbAppointment>>
where
    E: Executor<'e, Database = Postgres>,
{
    tracing::debug!(
        "Setting appointment {} from {} to {}",
        change.id,
        change.expected,
        change.status
    );

    let sql = format!(
        r#"
        UPDATE appointments
        SET status = $3,
            reason = COALESCE($4, reason),
            canceled_by = COALESCE($5, canceled_by),
            canceled_at = COALESCE($6, canceled_at),
            updated_by = COALESCE($7, updated_by),
            updated_at = $8
        WHERE id = $1
          AND status = $2
          AND deleted_at IS NULL
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, DbAppointment>(&sql)
        .bind(change.id)
        .bind(change.expected.as_str())
        .bind(change.status.as_str())
        .bind(change.reason.as_deref())
        .bind(change.canceled_by)
        .bind(change.canceled_at)
        .bind(change.updated_by)
        .bind(change.updated_at)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

pub async fn soft_delete_appointment<'e, E>(
    executor: E,
    id: Uuid,
    deleted_by: Uuid,
    at: DateTime<Utc>,
) -> Result<Option<DbAppointment>>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!(
        r#"
        UPDATE appointments
        SET deleted_at = $3, updated_by = $2, updated_at = $3
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, DbAppointment>(&sql)
        .bind(id)
        .bind(deleted_by)
        .bind(at)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Soft-delete a canceled row that is being rebooked. Returns the number of
/// rows retired, zero if someone else got there first.
pub async fn retire_canceled_appointment<'e, E>(executor: E, id: Uuid, at: DateTime<Utc>) -> Result<u64>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET deleted_at = $2, updated_at = $2
        WHERE id = $1 AND deleted_at IS NULL AND status = 'canceled'
        "#,
    )
    .bind(id)
    .bind(at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
