//! Core data models.
//!
//! Store operations return these typed records rather than positional rows,
//! so fetch variants that select different column subsets cannot introduce
//! field-order bugs.

use serde::Serialize;

/// A stored note. `summary` is `None` until the summarizer has processed the
/// note successfully; a failed attempt leaves it exactly as it was.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub summary: Option<String>,
    pub imported_at: i64,
}

/// The subset of a note the relevance selector works on. Constructing one
/// requires a summary, which is how the "no summary, no candidate"
/// precondition is enforced.
#[derive(Debug, Clone, Serialize)]
pub struct SummarizedNote {
    pub id: String,
    pub filename: String,
    pub summary: String,
}
