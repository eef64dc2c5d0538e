use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the schema on an existing pool. Idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id          TEXT PRIMARY KEY,
            filename    TEXT NOT NULL,
            content     TEXT NOT NULL,
            summary     TEXT,
            dedup_hash  TEXT NOT NULL,
            imported_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notes_dedup_hash ON notes(dedup_hash)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_notes_imported_at ON notes(imported_at)")
        .execute(pool)
        .await?;

    Ok(())
}
