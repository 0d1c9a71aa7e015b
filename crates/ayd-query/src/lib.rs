//! Question answering for AskYourDocs.
//!
//! The [`QueryEngine`] retrieves chunks from a collection by vector
//! similarity, BM25 keyword matching, or both fused by reciprocal rank, then
//! asks a [`LanguageModel`](ayd_llm::LanguageModel) to answer from them.

#![warn(missing_docs)]

mod engine;
mod error;
mod fusion;
mod prompt;
mod validation;

pub use engine::{
    Answer, KeywordHit, NO_RESULTS_ANSWER, PREVIEW_CHARS, QueryEngine, RetrieveOptions,
    RetrievedChunk, SimilarDocument, Source, preview,
};
pub use error::QueryError;
pub use fusion::{RRF_K, reciprocal_rank_fusion};
pub use prompt::{SYSTEM_PROMPT, build_context, build_prompt};
pub use validation::{
    DEFAULT_MAX_INPUT_LENGTH, MAX_QUESTION_LENGTH, MIN_QUESTION_CHARS, is_safe_filename,
    sanitize_input, validate_question,
};
