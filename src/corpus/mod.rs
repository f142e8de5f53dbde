//! Corpus loading and saving
//!
//! The corpus is one JSON document:
//!
//! ```json
//! {
//!   "meta": { "guild_id": "...", "generated_at": "..." },
//!   "users": { "<id>": { "id": "<id>", "display_name": "...", ... } },
//!   "messages": [
//!     { "author_id": "<id>", "type": "text", "content": "...",
//!       "msg_id": "<snowflake>", "channel_id": "<snowflake>" }
//!   ]
//! }
//! ```
//!
//! Individual malformed messages are skipped and counted; a corpus missing
//! a whole section is rejected.

mod loader;
mod writer;

pub use loader::{load_corpus, parse_corpus};
pub use writer::{default_output_path, save_scored};

use crate::models::{AuthorMap, Record};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing a corpus
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Failed to read corpus {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in corpus: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Corpus has no '{0}' section")]
    MissingSection(&'static str),

    #[error("Corpus section '{section}' must be {expected}")]
    SectionType {
        section: &'static str,
        expected: &'static str,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize scored corpus: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// A validated corpus, ready for scoring
#[derive(Debug, Clone)]
pub struct Corpus {
    /// Passed through to the output untouched
    pub meta: serde_json::Value,
    pub authors: AuthorMap,
    /// Input order is preserved
    pub records: Vec<Record>,
}

/// What the loader kept and dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Messages present in the input
    pub total_messages: usize,
    /// Malformed messages (missing field, bad id, unknown type, empty content)
    pub skipped: usize,
    /// Messages dropped as duplicate content
    pub deduped: usize,
    /// Text messages dropped for being shorter than `min_text_words`
    pub filtered: usize,
    /// Malformed user profiles
    pub skipped_users: usize,
    /// Authors whose `joined_at` moved earlier
    pub joined_at_tightened: usize,
}

impl LoadReport {
    pub fn kept(&self) -> usize {
        self.total_messages - self.skipped - self.deduped - self.filtered
    }
}

/// Output of [`load_corpus`]
#[derive(Debug, Clone)]
pub struct LoadedCorpus {
    pub corpus: Corpus,
    pub report: LoadReport,
}
