use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS modalities (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        slot_type VARCHAR(16) NOT NULL DEFAULT 'minutes',
        slot_duration_minutes INTEGER NULL,
        max_bookable_days INTEGER NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_slot_type CHECK (slot_type IN ('minutes', 'days')),
        CONSTRAINT positive_slot_duration CHECK (slot_duration_minutes IS NULL OR slot_duration_minutes > 0),
        CONSTRAINT positive_max_days CHECK (max_bookable_days IS NULL OR max_bookable_days > 0)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS modality_schedules (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        modality_id UUID NOT NULL REFERENCES modalities(id) ON DELETE CASCADE,
        day_of_week SMALLINT NULL,
        date DATE NULL,
        shift_period VARCHAR(16) NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        patients_per_shift INTEGER NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        CONSTRAINT valid_day_of_week CHECK (day_of_week IS NULL OR day_of_week BETWEEN 0 AND 6),
        CONSTRAINT weekday_or_date CHECK ((day_of_week IS NULL) <> (date IS NULL)),
        CONSTRAINT valid_shift_period CHECK (shift_period IN ('morning', 'afternoon')),
        CONSTRAINT valid_shift_range CHECK (end_time > start_time),
        CONSTRAINT valid_patient_count CHECK (patients_per_shift IS NULL OR patients_per_shift >= 0)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        modality_id UUID NOT NULL REFERENCES modalities(id) ON DELETE CASCADE,
        patient_id UUID NOT NULL,
        date DATE NOT NULL,
        time TIME NULL,
        end_date DATE NULL,
        duration_days INTEGER NULL,
        status VARCHAR(16) NOT NULL DEFAULT 'scheduled',
        reason TEXT NULL,
        created_by UUID NULL,
        updated_by UUID NULL,
        canceled_by UUID NULL,
        canceled_at TIMESTAMP WITH TIME ZONE NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        deleted_at TIMESTAMP WITH TIME ZONE NULL,
        CONSTRAINT valid_status CHECK (status IN ('scheduled', 'confirmed', 'canceled', 'pending', 'done', 'in_progress')),
        CONSTRAINT valid_period CHECK (end_date IS NULL OR end_date >= date),
        CONSTRAINT positive_duration CHECK (duration_days IS NULL OR duration_days > 0)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS modality_force_overrides (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        modality_id UUID NOT NULL REFERENCES modalities(id) ON DELETE CASCADE,
        user_id UUID NOT NULL,
        is_able_to_force BOOLEAN NOT NULL DEFAULT FALSE,
        start_time TIME NULL,
        end_time TIME NULL,
        number_of_patients INTEGER NULL,
        UNIQUE (modality_id, user_id)
    );
    "#,
];

// One live booking per minutes-mode slot and one active shift definition per
// weekday or date and period. Days-mode overlap cannot be expressed as a plain
// unique index and is enforced under the modality lock.
const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_appointments_active_slot ON appointments(modality_id, date, time) WHERE time IS NOT NULL AND deleted_at IS NULL AND status <> 'canceled'",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_modality_schedules_recurring ON modality_schedules(modality_id, day_of_week, shift_period) WHERE date IS NULL AND is_active",
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_modality_schedules_dated ON modality_schedules(modality_id, date, shift_period) WHERE date IS NOT NULL AND is_active",
    "CREATE INDEX IF NOT EXISTS idx_appointments_modality_date ON appointments(modality_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_modality_end_date ON appointments(modality_id, end_date)",
    "CREATE INDEX IF NOT EXISTS idx_modality_schedules_modality_id ON modality_schedules(modality_id)",
    "CREATE INDEX IF NOT EXISTS idx_modality_schedules_date ON modality_schedules(modality_id, date)",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for statement in TABLES {
        sqlx::query(statement).execute(pool).await?;
    }

    for statement in INDEXES {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
