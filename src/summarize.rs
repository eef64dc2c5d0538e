//! Summarization drivers.
//!
//! The batch driver walks every note still lacking a summary, attempts each
//! one independently, and commits each success immediately. A failure (or a
//! crash) never touches what earlier notes already wrote, and the next run
//! picks up exactly the notes that remain pending.

use anyhow::Result;
use sqlx::SqlitePool;
use std::io::Write;
use std::time::Duration;

use crate::config::Config;
use crate::db;
use crate::llm::{OllamaClient, TextGenerator};
use crate::store;

pub fn summary_prompt(content: &str) -> String {
    format!("Summarize this note in 1-2 sentences:\n\n{}", content)
}

/// Tally of a batch run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub pending: u64,
    pub summarized: u64,
    pub failed: u64,
}

/// Outcome of summarizing a single note by id.
#[derive(Debug)]
pub enum SingleOutcome {
    Summarized { summary: String },
    NotFound,
    Failed { error: String },
}

/// CLI entry point for `chestnut summarize [--id <id>]`.
pub async fn run_summarize(config: &Config, id: Option<String>) -> Result<()> {
    let pool = db::connect(config).await?;
    let llm = OllamaClient::new(&config.llm)?;

    match id {
        Some(id) => match summarize_one(config, &pool, &llm, &id).await? {
            SingleOutcome::Summarized { summary } => {
                println!("Summarized {}:", id);
                println!("{}", summary);
            }
            SingleOutcome::NotFound => {
                eprintln!("Error: note not found: {}", id);
                pool.close().await;
                std::process::exit(1);
            }
            SingleOutcome::Failed { error } => {
                eprintln!("Failed to summarize {}: {}", id, error);
                pool.close().await;
                std::process::exit(1);
            }
        },
        None => {
            let report = summarize_pending(config, &pool, &llm).await?;
            println!("summarize");
            println!("  pending: {}", report.pending);
            println!("  summarized: {}", report.summarized);
            println!("  failed: {}", report.failed);
        }
    }

    pool.close().await;
    Ok(())
}

/// Summarize every note that lacks a summary. Per-note failures are logged
/// and skipped; the batch always runs to completion.
pub async fn summarize_pending(
    config: &Config,
    pool: &SqlitePool,
    llm: &dyn TextGenerator,
) -> Result<BatchReport> {
    let pending = store::fetch_missing_summary(pool).await?;
    let timeout = Duration::from_secs(config.llm.context_timeout_secs);

    let mut report = BatchReport {
        pending: pending.len() as u64,
        ..Default::default()
    };

    for (i, note) in pending.iter().enumerate() {
        // Flush so the prefix is visible while the model call is in flight.
        print!("[{}/{}] {} ... ", i + 1, pending.len(), note.filename);
        let _ = std::io::stdout().flush();

        match attempt(llm, &note.content, timeout).await {
            Ok(summary) => {
                store::update_summary(pool, &note.id, &summary).await?;
                report.summarized += 1;
                println!("ok");
            }
            Err(e) => {
                report.failed += 1;
                println!("failed: {}", e);
            }
        }
    }

    Ok(report)
}

/// Summarize one note by id, overwriting any existing summary on success.
pub async fn summarize_one(
    config: &Config,
    pool: &SqlitePool,
    llm: &dyn TextGenerator,
    id: &str,
) -> Result<SingleOutcome> {
    let note = match store::fetch_note(pool, id).await? {
        Some(note) => note,
        None => return Ok(SingleOutcome::NotFound),
    };

    let timeout = Duration::from_secs(config.llm.context_timeout_secs);
    match attempt(llm, &note.content, timeout).await {
        Ok(summary) => {
            store::update_summary(pool, &note.id, &summary).await?;
            Ok(SingleOutcome::Summarized { summary })
        }
        Err(error) => Ok(SingleOutcome::Failed { error }),
    }
}

/// One generation attempt. A blank response is a failure: a summary must be
/// a non-empty string or the column stays untouched.
async fn attempt(
    llm: &dyn TextGenerator,
    content: &str,
    timeout: Duration,
) -> Result<String, String> {
    match llm.generate(&summary_prompt(content), timeout).await {
        Ok(text) if text.trim().is_empty() => Err("model returned an empty summary".to_string()),
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => Err(e.to_string()),
    }
}
