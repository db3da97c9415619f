//! Similarity matching: stable argmax over cosine scores with threshold
//! acceptance.
//!
//! This is a brute-force scan over the reference set. Reference embeddings
//! are computed once per process and cached by their owning index
//! ([`crate::faq::FaqIndex`], [`crate::intent::IntentIndex`]), so the scan
//! is the only per-query cost.

use crate::embedding::cosine_similarity;

/// Best reference for a query vector: `(index, score)` of the
/// first-encountered maximum, or `None` for an empty reference set.
pub fn best_match(query: &[f32], references: &[Vec<f32>]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (i, reference) in references.iter().enumerate() {
        let score = cosine_similarity(query, reference);
        match best {
            // Strict > keeps the first-encountered maximum on ties.
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((i, score)),
        }
    }

    best
}

/// Acceptance is strictly greater than the threshold; a score exactly at
/// the threshold is a no-match.
pub fn accepts(score: f32, threshold: f32) -> bool {
    score > threshold
}
