//! Keyword index schema.
//!
//! - `id`: chunk identifier (string, stored)
//! - `document_id`: owning document, used to delete a file's chunks (string, stored)
//! - `file_path`: absolute source path (stored only)
//! - `file_name`: file name (text, stored, boosted 2.0x)
//! - `body`: chunk text (text, stored)

use tantivy::schema::{
    Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions,
};

use crate::analyzer::AYD_TOKENIZER;

/// Boost applied to file-name matches.
pub const FILE_NAME_BOOST: f32 = 2.0;

/// Handles to all fields in the keyword schema.
#[derive(Debug, Clone)]
pub struct KeywordSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Chunk identifier.
    pub id: Field,
    /// Owning document.
    pub document_id: Field,
    /// Source path.
    pub file_path: Field,
    /// File name.
    pub file_name: Field,
    /// Chunk text.
    pub body: Field,
}

impl KeywordSchema {
    /// Creates the schema.
    pub fn new() -> Self {
        let mut builder = Schema::builder();
        let analyzed = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(AYD_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let id = builder.add_text_field("id", STRING | STORED);
        let document_id = builder.add_text_field("document_id", STRING | STORED);
        let file_path = builder.add_text_field("file_path", STORED);
        let file_name = builder.add_text_field("file_name", analyzed.clone());
        let body = builder.add_text_field("body", analyzed);

        Self {
            schema: builder.build(),
            id,
            document_id,
            file_path,
            file_name,
            body,
        }
    }

    /// Returns the underlying Tantivy schema.
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Default for KeywordSchema {
    fn default() -> Self {
        Self::new()
    }
}
