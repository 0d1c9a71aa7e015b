//! AskYourDocs: privacy-first, local-only document Q&A.
//!
//! Documents are chunked, embedded and stored in a local collection; questions
//! are answered by a local or remote language model from the retrieved chunks.

#![warn(missing_docs)]

pub mod cli;
