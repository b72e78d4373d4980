use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

/// Applied in order at startup. Every statement is idempotent.
const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "users, jobs, applications, reviews",
        sql: r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    fullname TEXT,
    role TEXT NOT NULL DEFAULT 'worker' CHECK (role IN ('employer', 'worker')),
    rating DOUBLE PRECISION CHECK (rating IS NULL OR (rating >= 0 AND rating <= 5)),
    rating_count INTEGER NOT NULL DEFAULT 0,
    latitude DOUBLE PRECISION,
    longitude DOUBLE PRECISION,
    address JSONB,
    interested_categories TEXT[] NOT NULL DEFAULT '{}',
    preference_order TEXT[] NOT NULL DEFAULT '{}',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS jobs (
    id UUID PRIMARY KEY,
    owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    description TEXT,
    category TEXT NOT NULL,
    hour_rate DOUBLE PRECISION NOT NULL CHECK (hour_rate >= 0),
    duration JSONB NOT NULL,
    address JSONB NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    images TEXT[] NOT NULL DEFAULT '{}',
    max_workers INTEGER,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'in_progress', 'closed')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_jobs_active_coordinates
    ON jobs(latitude, longitude)
    WHERE status = 'active';
CREATE INDEX IF NOT EXISTS idx_jobs_owner ON jobs(owner_id);

CREATE TABLE IF NOT EXISTS applications (
    id UUID PRIMARY KEY,
    job_id UUID NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    worker_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    employer_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    worker_agreed BOOLEAN NOT NULL DEFAULT FALSE,
    employer_agreed BOOLEAN NOT NULL DEFAULT FALSE,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'in_progress', 'closed')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (job_id, worker_id)
);

CREATE INDEX IF NOT EXISTS idx_applications_worker ON applications(worker_id);

CREATE TABLE IF NOT EXISTS reviews (
    id UUID PRIMARY KEY,
    author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    target_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    rating SMALLINT NOT NULL CHECK (rating BETWEEN 1 AND 5),
    comment TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    UNIQUE (author_id, target_id)
);

CREATE INDEX IF NOT EXISTS idx_reviews_target ON reviews(target_id);
"#,
    },
    Migration {
        id: 2,
        description: "job selected worker, onboarding flag, employer and author indexes",
        sql: r#"
ALTER TABLE jobs
    ADD COLUMN IF NOT EXISTS selected_worker_id UUID REFERENCES users(id) ON DELETE SET NULL;
ALTER TABLE users
    ADD COLUMN IF NOT EXISTS introduced BOOLEAN NOT NULL DEFAULT FALSE;

CREATE INDEX IF NOT EXISTS idx_applications_employer ON applications(employer_id);
CREATE INDEX IF NOT EXISTS idx_reviews_author ON reviews(author_id);
"#,
    },
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Applies every migration not yet recorded in `schema_migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            id INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    for migration in MIGRATIONS {
        let applied: Option<i32> =
            sqlx::query_scalar("SELECT id FROM schema_migrations WHERE id = $1")
                .bind(migration.id)
                .fetch_optional(pool)
                .await?;
        if applied.is_some() {
            continue;
        }

        let mut tx = pool.begin().await?;
        (&mut *tx)
            .execute(migration.sql)
            .await
            .with_context(|| format!("migration {} failed", migration.id))?;
        sqlx::query("INSERT INTO schema_migrations (id, description) VALUES ($1, $2)")
            .bind(migration.id)
            .bind(migration.description)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Applied migration {}: {}", migration.id, migration.description);
    }

    Ok(())
}
