//! Question answering over a collection.

use std::{
    collections::{BTreeMap, HashSet},
    time::{Duration, Instant},
};

use ayd_config::{Config, RetrievalConfig, RetrievalMode};
use ayd_index::{ChunkHit, VectorStoreManager};
use ayd_llm::{Embedder, LanguageModel, LlmError};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    QueryError,
    fusion::{by_score_then_id, from_keyword_hits, from_vector_hits, reciprocal_rank_fusion},
    prompt::{build_context, build_prompt},
    validation::validate_question,
};

/// Characters shown in result previews.
pub const PREVIEW_CHARS: usize = 200;

/// Answer text used when retrieval finds nothing.
pub const NO_RESULTS_ANSWER: &str =
    "I couldn't find any relevant documents to answer this question. Try rephrasing it, \
     lowering the similarity threshold, or ingesting more documents.";

/// A chunk selected for a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    /// Chunk id, `<document_id>#<index>`.
    pub id: String,
    /// Owning document.
    pub document_id: String,
    /// Absolute source path.
    pub file_path: String,
    /// File name.
    pub file_name: String,
    /// Chunk text.
    pub text: String,
    /// Ranking score in the retrieval mode used.
    pub score: f32,
    /// Cosine similarity, when found by vector search.
    pub vector_score: Option<f32>,
    /// Raw BM25 score, when found by keyword search.
    pub keyword_score: Option<f32>,
}

impl RetrievedChunk {
    /// Wraps a store hit, keeping its score as the ranking score.
    pub fn from_hit(hit: ChunkHit, vector_score: Option<f32>, keyword_score: Option<f32>) -> Self {
        Self {
            id: hit.id,
            document_id: hit.document_id,
            file_path: hit.file_path,
            file_name: hit.file_name,
            text: hit.text,
            score: hit.score,
            vector_score,
            keyword_score,
        }
    }
}

/// A file cited by an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    /// Absolute source path.
    pub file_path: String,
    /// File name.
    pub file_name: String,
    /// Best chunk score from this file.
    pub score: f32,
    /// Start of the best chunk.
    pub preview: String,
}

/// The result of [`QueryEngine::query`].
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The question as asked, trimmed.
    pub question: String,
    /// Generated answer text.
    pub answer: String,
    /// Files the context came from, best first.
    pub sources: Vec<Source>,
    /// Retrieval mode used.
    pub mode: RetrievalMode,
    /// Time spent retrieving and generating.
    pub elapsed: Duration,
}

/// A keyword search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordHit {
    /// Absolute source path.
    pub file: String,
    /// BM25 score.
    pub score: f32,
    /// Start of the chunk text.
    pub preview: String,
}

/// A document similar to a query text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarDocument {
    /// Absolute source path.
    pub file_path: String,
    /// File name.
    pub file_name: String,
    /// Best chunk similarity.
    pub similarity_score: f32,
    /// Start of the best chunk.
    pub content_preview: String,
}

/// Retrieval parameters for one question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrieveOptions {
    /// Chunks to keep.
    pub top_k: usize,
    /// How to retrieve.
    pub mode: RetrievalMode,
    /// Minimum cosine similarity for vector matches.
    pub threshold: f32,
}

impl RetrieveOptions {
    /// Options from the `retrieval` config section.
    pub const fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            top_k: config.top_k,
            mode: config.retrieval_mode,
            threshold: config.similarity_threshold,
        }
    }
}

/// Retrieves context and generates answers.
pub struct QueryEngine {
    /// Collection being queried.
    store: VectorStoreManager,
    /// Embeds questions; must match the collection's model.
    embedder: Box<dyn Embedder>,
    /// Generates answers.
    llm: Box<dyn LanguageModel>,
    /// Default retrieval options.
    defaults: RetrieveOptions,
    /// Context budget in characters.
    max_context_length: usize,
}

impl QueryEngine {
    /// Creates an engine over `store`.
    pub fn new(
        config: &Config,
        store: VectorStoreManager,
        embedder: Box<dyn Embedder>,
        llm: Box<dyn LanguageModel>,
    ) -> Self {
        Self {
            store,
            embedder,
            llm,
            defaults: RetrieveOptions::from_config(&config.retrieval),
            max_context_length: config.retrieval.max_context_length,
        }
    }

    /// Returns true if the collection holds any chunks.
    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    /// The collection being queried.
    pub const fn store(&self) -> &VectorStoreManager {
        &self.store
    }

    /// Retrieval options from the configuration.
    pub const fn default_options(&self) -> RetrieveOptions {
        self.defaults
    }

    /// Finds the chunks most relevant to `question`, best first.
    pub fn retrieve(
        &mut self,
        question: &str,
        options: &RetrieveOptions,
    ) -> Result<Vec<RetrievedChunk>, QueryError> {
        if options.top_k == 0 {
            return Ok(Vec::new());
        }
        let chunks = match options.mode {
            RetrievalMode::Vector => {
                let embedding = self.embed_query(question)?;
                let hits = self.store.query_vectors(&embedding, options.top_k, options.threshold)?;
                from_vector_hits(hits)
            }
            RetrievalMode::Keyword => {
                let hits = self.store.keyword_search(question, options.top_k)?;
                from_keyword_hits(hits)
            }
            RetrievalMode::Hybrid => {
                let pool = options.top_k.saturating_mul(2);
                let embedding = self.embed_query(question)?;
                let vector = self.store.query_vectors(&embedding, pool, options.threshold)?;
                let keyword = self.store.keyword_search(question, pool)?;
                debug!(vector = vector.len(), keyword = keyword.len(), "fusing results");
                reciprocal_rank_fusion(vector, keyword, options.top_k)
            }
        };
        for chunk in &chunks {
            debug!(
                id = %chunk.id,
                score = chunk.score,
                vector = ?chunk.vector_score,
                keyword = ?chunk.keyword_score,
                "retrieved chunk"
            );
        }
        Ok(chunks)
    }

    /// Answers `question` with the configured retrieval options.
    ///
    /// When `on_token` is given the answer is streamed through it as it arrives.
    pub fn query(
        &mut self,
        question: &str,
        on_token: Option<&mut dyn FnMut(&str)>,
    ) -> Result<Answer, QueryError> {
        let options = self.defaults;
        self.query_with(question, &options, on_token)
    }

    /// Answers `question` with explicit retrieval options.
    pub fn query_with(
        &mut self,
        question: &str,
        options: &RetrieveOptions,
        on_token: Option<&mut dyn FnMut(&str)>,
    ) -> Result<Answer, QueryError> {
        let start = Instant::now();
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }
        validate_question(question).map_err(QueryError::Invalid)?;
        if !self.is_ready() {
            return Err(QueryError::NotReady);
        }

        let chunks = self.retrieve(question, options)?;
        if chunks.is_empty() {
            info!(mode = %options.mode, "no relevant chunks");
            return Ok(Answer {
                question: question.to_string(),
                answer: NO_RESULTS_ANSWER.to_string(),
                sources: Vec::new(),
                mode: options.mode,
                elapsed: start.elapsed(),
            });
        }

        let (context, used) = build_context(&chunks, self.max_context_length);
        let prompt = build_prompt(&context, question);
        debug!(chunks = used, context_chars = context.len(), model = self.llm.name(), "prompting");
        let answer = match on_token {
            Some(callback) => self.llm.complete_streaming(&prompt, callback)?,
            None => self.llm.complete(&prompt)?,
        };

        Ok(Answer {
            question: question.to_string(),
            answer: answer.trim().to_string(),
            sources: sources(&chunks[..used]),
            mode: options.mode,
            elapsed: start.elapsed(),
        })
    }

    /// BM25 search over chunks, best first.
    pub fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<KeywordHit>, QueryError> {
        let hits = self.store.keyword_search(query, limit)?;
        Ok(hits
            .into_iter()
            .map(|hit| KeywordHit {
                preview: preview(&hit.text),
                file: hit.file_path,
                score: hit.score,
            })
            .collect())
    }

    /// Documents whose best chunk is most similar to `query`.
    pub fn get_similar_documents(
        &mut self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarDocument>, QueryError> {
        if top_k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let embedding = self.embed_query(query)?;
        let chunk_count = self.store.get_document_count()?;
        let hits = self.store.query_vectors(&embedding, chunk_count, 0.0)?;

        // Hits arrive best first, so the first chunk seen per document is its best.
        let mut docs: Vec<SimilarDocument> = Vec::new();
        let mut seen = HashSet::new();
        for hit in hits {
            if !seen.insert(hit.document_id.clone()) {
                continue;
            }
            docs.push(SimilarDocument {
                content_preview: preview(&hit.text),
                file_path: hit.file_path,
                file_name: hit.file_name,
                similarity_score: hit.score,
            });
            if docs.len() == top_k {
                break;
            }
        }
        Ok(docs)
    }

    /// Embeds a single query text.
    fn embed_query(&mut self, text: &str) -> Result<Vec<f32>, QueryError> {
        let mut vectors = self.embedder.embed(&[text.to_string()])?;
        vectors.pop().ok_or_else(|| {
            QueryError::Llm(LlmError::Embedding {
                message: "provider returned no embedding for the query".into(),
            })
        })
    }
}

/// One source per file, keeping the best chunk, ordered by score.
fn sources(chunks: &[RetrievedChunk]) -> Vec<Source> {
    let mut best: BTreeMap<&str, &RetrievedChunk> = BTreeMap::new();
    for chunk in chunks {
        best.entry(chunk.file_path.as_str())
            .and_modify(|current| {
                if chunk.score > current.score {
                    *current = chunk;
                }
            })
            .or_insert(chunk);
    }
    let mut chunks: Vec<RetrievedChunk> = best.into_values().cloned().collect();
    chunks.sort_by(by_score_then_id);
    chunks
        .into_iter()
        .map(|chunk| Source {
            preview: preview(&chunk.text),
            file_path: chunk.file_path,
            file_name: chunk.file_name,
            score: chunk.score,
        })
        .collect()
}

/// The first [`PREVIEW_CHARS`] characters of `text` with whitespace collapsed.
pub fn preview(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}
