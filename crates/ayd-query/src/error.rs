//! Error types for the ayd-query crate.

use ayd_index::IndexError;
use ayd_llm::LlmError;
use thiserror::Error;

/// Errors raised while answering or searching.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The question was blank.
    #[error("Question cannot be empty")]
    EmptyQuestion,

    /// The question or an option failed validation.
    #[error("{0}")]
    Invalid(String),

    /// No documents have been ingested into the collection.
    #[error("no documents have been ingested yet")]
    NotReady,

    /// Storage error.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Provider error.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl QueryError {
    /// A follow-up suggestion for the user, when there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotReady => Some("Run 'askyourdocs ingest <path>' first".into()),
            Self::Index(e) => e.hint(),
            Self::Llm(e) => e.hint(),
            _ => None,
        }
    }
}
