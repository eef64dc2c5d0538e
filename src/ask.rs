//! Answer composition.
//!
//! Turns a ranked shortlist of notes plus the original question into a final
//! answer: full note contents are concatenated into a bounded context block
//! and sent to the language model. If the selector found nothing relevant the
//! model is never called.

use anyhow::Result;
use sqlx::SqlitePool;
use std::time::Duration;

use crate::config::Config;
use crate::db;
use crate::llm::{OllamaClient, TextGenerator};
use crate::selector::{self, Selection};
use crate::store;

/// Provenance entry: a note whose content went into the answer's context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UsedNote {
    pub filename: String,
    pub summary: String,
}

/// Outcome of asking a question.
#[derive(Debug)]
pub enum AskOutcome {
    Answered { answer: String, used: Vec<UsedNote> },
    /// The model call failed; the cause is surfaced instead of an answer.
    LlmFailed { error: String, used: Vec<UsedNote> },
    NoRelevantNotes,
}

pub fn question_prompt(question: &str, context: &str) -> String {
    format!("Context:\n{}\n\nQuestion: {}", context, question)
}

/// Concatenate full note contents into the context block: a filename header
/// per note, notes separated by a blank line, in ranked order.
fn build_context(notes: &[(String, String)]) -> String {
    notes
        .iter()
        .map(|(filename, content)| format!("File: {}\n{}", filename, content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Core ask flow shared by the CLI and the HTTP server: selector over stored
/// summaries, then the composer over full contents.
pub async fn answer_question(
    config: &Config,
    pool: &SqlitePool,
    llm: &dyn TextGenerator,
    question: &str,
    top_k: Option<usize>,
) -> Result<AskOutcome> {
    let question = question.trim();
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    if top_k == 0 {
        anyhow::bail!("top_k must be >= 1");
    }

    let candidates = store::fetch_summarized(pool).await?;
    let ranked = match selector::select(question, &candidates, top_k) {
        Selection::Relevant(ranked) => ranked,
        Selection::NoRelevantNotes => return Ok(AskOutcome::NoRelevantNotes),
    };

    let mut used = Vec::with_capacity(ranked.len());
    let mut contents = Vec::with_capacity(ranked.len());
    for r in &ranked {
        // Summaries and contents live in the same row; a selected id always
        // resolves unless the note was deleted out from under us.
        if let Some(note) = store::fetch_note(pool, &r.note.id).await? {
            contents.push((note.filename.clone(), note.content));
            used.push(UsedNote {
                filename: r.note.filename.clone(),
                summary: r.note.summary.clone(),
            });
        }
    }

    if contents.is_empty() {
        return Ok(AskOutcome::NoRelevantNotes);
    }

    let prompt = question_prompt(question, &build_context(&contents));
    let timeout = Duration::from_secs(config.llm.context_timeout_secs);

    match llm.generate(&prompt, timeout).await {
        Ok(answer) => Ok(AskOutcome::Answered { answer, used }),
        Err(e) => Ok(AskOutcome::LlmFailed {
            error: e.to_string(),
            used,
        }),
    }
}

/// CLI entry point for `chestnut ask`.
pub async fn run_ask(config: &Config, question: &str, top_k: Option<usize>) -> Result<()> {
    let pool = db::connect(config).await?;
    let llm = OllamaClient::new(&config.llm)?;

    println!("Querying LLM... (may take a moment)");
    let outcome = answer_question(config, &pool, &llm, question, top_k).await?;
    pool.close().await;

    match outcome {
        AskOutcome::Answered { answer, used } => {
            println!("\nAnswer:\n{}", answer);
            println!("\nNotes used:");
            for note in &used {
                println!("  {} — {}", note.filename, note.summary);
            }
        }
        AskOutcome::LlmFailed { error, used } => {
            println!("\nAnswer:\nError querying LLM: {}", error);
            println!("\nNotes used:");
            for note in &used {
                println!("  {} — {}", note.filename, note.summary);
            }
        }
        AskOutcome::NoRelevantNotes => {
            println!("\nNo relevant notes found.");
        }
    }

    Ok(())
}
