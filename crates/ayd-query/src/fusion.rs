//! Score combination for hybrid retrieval.
//!
//! Vector similarities and BM25 scores live on different scales, so hybrid
//! retrieval fuses the two ranked lists by rank instead of by score:
//!
//! ```text
//! rrf(chunk) = Σ 1 / (k + rank)      rank starts at 1, k = 60
//! ```
//!
//! Fused scores are then divided by the best fused score so the top chunk
//! scores 1.0, the same top-score normalization applied to keyword results.

use std::{cmp::Ordering, collections::HashMap};

use ayd_index::ChunkHit;

use crate::RetrievedChunk;

/// Rank constant for reciprocal rank fusion.
pub const RRF_K: f32 = 60.0;

/// Orders chunks by score descending, then by id.
pub fn by_score_then_id(a: &RetrievedChunk, b: &RetrievedChunk) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.id.cmp(&b.id))
}

/// Divides every score by the maximum so the best hit scores 1.0.
///
/// Non-positive maxima leave scores unchanged.
pub fn normalize_by_max(chunks: &mut [RetrievedChunk]) {
    let max = chunks.iter().map(|c| c.score).fold(0.0_f32, f32::max);
    if max <= 0.0 {
        return;
    }
    for chunk in chunks {
        chunk.score /= max;
    }
}

/// Converts vector hits, keeping the cosine similarity as both score and vector score.
pub fn from_vector_hits(hits: Vec<ChunkHit>) -> Vec<RetrievedChunk> {
    hits.into_iter()
        .map(|hit| {
            let score = hit.score;
            RetrievedChunk::from_hit(hit, Some(score), None)
        })
        .collect()
}

/// Converts keyword hits and normalizes their BM25 scores by the maximum.
pub fn from_keyword_hits(hits: Vec<ChunkHit>) -> Vec<RetrievedChunk> {
    let mut chunks: Vec<_> = hits
        .into_iter()
        .map(|hit| {
            let score = hit.score;
            RetrievedChunk::from_hit(hit, None, Some(score))
        })
        .collect();
    normalize_by_max(&mut chunks);
    chunks
}

/// Fuses two ranked lists with reciprocal rank fusion and keeps the best `top_k`.
///
/// Both inputs must be ordered best first. A chunk found by both searches
/// carries both raw scores.
pub fn reciprocal_rank_fusion(
    vector: Vec<ChunkHit>,
    keyword: Vec<ChunkHit>,
    top_k: usize,
) -> Vec<RetrievedChunk> {
    let mut fused: HashMap<String, RetrievedChunk> = HashMap::new();

    for (rank, hit) in vector.into_iter().enumerate() {
        let contribution = rrf_term(rank);
        let score = hit.score;
        let mut chunk = RetrievedChunk::from_hit(hit, Some(score), None);
        chunk.score = contribution;
        fused.insert(chunk.id.clone(), chunk);
    }

    for (rank, hit) in keyword.into_iter().enumerate() {
        let contribution = rrf_term(rank);
        if let Some(existing) = fused.get_mut(&hit.id) {
            existing.score += contribution;
            existing.keyword_score = Some(hit.score);
        } else {
            let score = hit.score;
            let mut chunk = RetrievedChunk::from_hit(hit, None, Some(score));
            chunk.score = contribution;
            fused.insert(chunk.id.clone(), chunk);
        }
    }

    let mut chunks: Vec<_> = fused.into_values().collect();
    chunks.sort_by(by_score_then_id);
    chunks.truncate(top_k);
    normalize_by_max(&mut chunks);
    chunks
}

/// RRF contribution of a zero-based rank.
fn rrf_term(rank: usize) -> f32 {
    1.0 / (RRF_K + rank as f32 + 1.0)
}
