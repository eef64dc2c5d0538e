//! Typed store operations over the `notes` table.
//!
//! Every fetch variant returns a [`Note`] or [`SummarizedNote`] record, never
//! a positional row. Ids are UUIDv4 strings assigned here on insert and are
//! the sole join key between fetch and update operations.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Note, SummarizedNote};

/// Insert a new note and return its id.
pub async fn add_note(
    pool: &SqlitePool,
    filename: &str,
    content: &str,
    dedup_hash: &str,
) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let imported_at = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO notes (id, filename, content, dedup_hash, imported_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(filename)
    .bind(content)
    .bind(dedup_hash)
    .bind(imported_at)
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn fetch_all(pool: &SqlitePool) -> Result<Vec<Note>> {
    let rows = sqlx::query(
        "SELECT id, filename, content, summary, imported_at FROM notes ORDER BY imported_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(note_from_row).collect())
}

/// Notes that still lack a summary, in import order.
pub async fn fetch_missing_summary(pool: &SqlitePool) -> Result<Vec<Note>> {
    let rows = sqlx::query(
        "SELECT id, filename, content, summary, imported_at FROM notes \
         WHERE summary IS NULL ORDER BY imported_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(note_from_row).collect())
}

/// Notes that have a summary, as selector candidates.
pub async fn fetch_summarized(pool: &SqlitePool) -> Result<Vec<SummarizedNote>> {
    let rows = sqlx::query(
        "SELECT id, filename, summary FROM notes \
         WHERE summary IS NOT NULL ORDER BY imported_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| SummarizedNote {
            id: row.get("id"),
            filename: row.get("filename"),
            summary: row.get("summary"),
        })
        .collect())
}

pub async fn fetch_note(pool: &SqlitePool, id: &str) -> Result<Option<Note>> {
    let row = sqlx::query(
        "SELECT id, filename, content, summary, imported_at FROM notes WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(note_from_row))
}

/// Overwrite a note's summary. Only called with a successful, non-empty
/// summary; failures never reach this function.
pub async fn update_summary(pool: &SqlitePool, id: &str, summary: &str) -> Result<()> {
    sqlx::query("UPDATE notes SET summary = ? WHERE id = ?")
        .bind(summary)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Id of the note with this dedup hash, if one exists. Used to skip
/// re-importing unchanged files.
pub async fn find_by_hash(pool: &SqlitePool, dedup_hash: &str) -> Result<Option<String>> {
    let id: Option<String> = sqlx::query_scalar("SELECT id FROM notes WHERE dedup_hash = ?")
        .bind(dedup_hash)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

fn note_from_row(row: &sqlx::sqlite::SqliteRow) -> Note {
    Note {
        id: row.get("id"),
        filename: row.get("filename"),
        content: row.get("content"),
        summary: row.get("summary"),
        imported_at: row.get("imported_at"),
    }
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    use std::str::FromStr;

    let options = sqlx::sqlite::SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    crate::migrate::apply(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_pre_summary() {
        let pool = test_pool().await;

        let id = add_note(&pool, "a.txt", "hello world", "h1").await.unwrap();

        let all = fetch_all(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].filename, "a.txt");
        assert_eq!(all[0].content, "hello world");
        assert_eq!(all[0].summary, None);
    }

    #[tokio::test]
    async fn missing_summary_excludes_summarized() {
        let pool = test_pool().await;

        let a = add_note(&pool, "a.txt", "aaa", "ha").await.unwrap();
        let b = add_note(&pool, "b.txt", "bbb", "hb").await.unwrap();

        update_summary(&pool, &a, "summary of a").await.unwrap();

        let pending = fetch_missing_summary(&pool).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b);

        let summarized = fetch_summarized(&pool).await.unwrap();
        assert_eq!(summarized.len(), 1);
        assert_eq!(summarized[0].id, a);
        assert_eq!(summarized[0].summary, "summary of a");
    }

    #[tokio::test]
    async fn update_summary_overwrites() {
        let pool = test_pool().await;

        let id = add_note(&pool, "a.txt", "aaa", "ha").await.unwrap();
        update_summary(&pool, &id, "first").await.unwrap();
        update_summary(&pool, &id, "second").await.unwrap();

        let note = fetch_note(&pool, &id).await.unwrap().unwrap();
        assert_eq!(note.summary.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn fetch_note_unknown_id() {
        let pool = test_pool().await;
        assert!(fetch_note(&pool, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_hash_detects_duplicates() {
        let pool = test_pool().await;

        let id = add_note(&pool, "a.txt", "aaa", "ha").await.unwrap();
        assert_eq!(find_by_hash(&pool, "ha").await.unwrap(), Some(id));
        assert_eq!(find_by_hash(&pool, "hb").await.unwrap(), None);
    }
}
