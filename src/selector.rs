//! Relevance selection.
//!
//! Ranks summarized notes against a question by lexical overlap: the score is
//! the number of distinct word tokens shared between the question and a
//! note's summary. Pure functions of their inputs, no store access.

use std::collections::HashSet;

use crate::models::SummarizedNote;

/// A candidate note with its overlap score.
#[derive(Debug, Clone)]
pub struct RankedNote {
    pub note: SummarizedNote,
    pub score: usize,
}

/// Outcome of relevance selection.
#[derive(Debug)]
pub enum Selection {
    /// At most `top_k` notes with score > 0, best first.
    Relevant(Vec<RankedNote>),
    /// Nothing overlaps the question at all (or the corpus is empty). The
    /// answer composer is never invoked in this case.
    NoRelevantNotes,
}

/// Split text into its set of word tokens.
///
/// A word is a maximal run of alphanumeric-or-underscore characters;
/// everything else separates. Tokens are lowercased, and each counts once
/// regardless of repetition.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Number of distinct tokens shared between a question's token set and a
/// summary.
fn overlap_score(question_tokens: &HashSet<String>, summary: &str) -> usize {
    tokenize(summary)
        .iter()
        .filter(|t| question_tokens.contains(*t))
        .count()
}

/// Rank candidates against the question and return the `top_k` best.
///
/// Candidates with zero overlap are dropped; if none remain the result is
/// [`Selection::NoRelevantNotes`]. Ordering is a documented total order
/// (score descending, then filename ascending, then id ascending), so equal
/// scores never depend on incidental fetch order.
pub fn select(question: &str, candidates: &[SummarizedNote], top_k: usize) -> Selection {
    let question_tokens = tokenize(question);
    if question_tokens.is_empty() {
        return Selection::NoRelevantNotes;
    }

    let mut ranked: Vec<RankedNote> = candidates
        .iter()
        .map(|note| RankedNote {
            note: note.clone(),
            score: overlap_score(&question_tokens, &note.summary),
        })
        .filter(|r| r.score > 0)
        .collect();

    if ranked.is_empty() {
        return Selection::NoRelevantNotes;
    }

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.note.filename.cmp(&b.note.filename))
            .then(a.note.id.cmp(&b.note.id))
    });
    ranked.truncate(top_k);

    Selection::Relevant(ranked)
}
