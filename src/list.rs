//! Listing of summarized notes.

use anyhow::Result;

use crate::config::Config;
use crate::db;
use crate::store;

/// CLI entry point for `chestnut list`.
pub async fn run_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let notes = store::fetch_summarized(&pool).await?;
    pool.close().await;

    if notes.is_empty() {
        println!("No summarized notes. Run `chestnut summarize` first.");
        return Ok(());
    }

    println!("--- Summarized notes ({}) ---", notes.len());
    for note in &notes {
        println!("{}", note.filename);
        println!("    id: {}", note.id);
        println!("    summary: {}", note.summary);
        println!();
    }

    Ok(())
}
