//! Intent routing over configured example sets.
//!
//! Each intent carries a list of reference phrasings and its own
//! acceptance threshold. A query is scored against every intent (per-intent
//! score = max over its examples) and the overall best intent wins if it
//! clears its threshold strictly; otherwise the query falls through to
//! generic FAQ matching.

use anyhow::Result;

use crate::config::{Config, IntentConfig};
use crate::embedding::{self, cosine_similarity};
use crate::matcher;

struct IntentEntry {
    name: String,
    threshold: f32,
    example_vecs: Vec<Vec<f32>>,
}

/// Intent example sets with their embeddings, computed once per process.
pub struct IntentIndex {
    intents: Vec<IntentEntry>,
}

impl IntentIndex {
    /// Embed every configured intent example with the configured provider.
    pub async fn build(config: &Config) -> Result<Self> {
        // One batch for all intents, then slice per intent.
        let all_examples: Vec<String> = config
            .intents
            .iter()
            .flat_map(|i| i.examples.iter().cloned())
            .collect();
        let all_vecs = embedding::embed_texts(&config.embedding, &all_examples).await?;
        if all_vecs.len() != all_examples.len() {
            anyhow::bail!(
                "Embedding provider returned {} vectors for {} intent examples",
                all_vecs.len(),
                all_examples.len()
            );
        }

        let mut intents = Vec::with_capacity(config.intents.len());
        let mut offset = 0;
        for intent in &config.intents {
            let count = intent.examples.len();
            intents.push(IntentEntry {
                name: intent.name.clone(),
                threshold: intent.threshold,
                example_vecs: all_vecs[offset..offset + count].to_vec(),
            });
            offset += count;
        }

        Ok(Self { intents })
    }

    /// Test-friendly constructor from pre-computed example vectors, in the
    /// same order as the config entries.
    pub fn from_parts(configs: &[IntentConfig], example_vecs: Vec<Vec<Vec<f32>>>) -> Self {
        let intents = configs
            .iter()
            .zip(example_vecs)
            .map(|(c, vecs)| IntentEntry {
                name: c.name.clone(),
                threshold: c.threshold,
                example_vecs: vecs,
            })
            .collect();
        Self { intents }
    }

    /// The winning intent name for a query vector, or `None` when no intent
    /// clears its threshold.
    pub fn detect(&self, query_vec: &[f32]) -> Option<&str> {
        let mut winner: Option<(&str, f32)> = None;

        for intent in &self.intents {
            let best = intent
                .example_vecs
                .iter()
                .map(|v| cosine_similarity(query_vec, v))
                .fold(f32::NEG_INFINITY, f32::max);

            if !matcher::accepts(best, intent.threshold) {
                continue;
            }
            match winner {
                Some((_, top)) if best <= top => {}
                _ => winner = Some((&intent.name, best)),
            }
        }

        winner.map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent_config(name: &str, threshold: f32, n_examples: usize) -> IntentConfig {
        IntentConfig {
            name: name.to_string(),
            examples: (0..n_examples).map(|i| format!("example {}", i)).collect(),
            threshold,
        }
    }

    fn two_intent_index() -> IntentIndex {
        // "consumption" points along x, "invoice" along y.
        IntentIndex::from_parts(
            &[
                intent_config("consumption", 0.75, 2),
                intent_config("invoice", 0.75, 2),
            ],
            vec![
                vec![vec![1.0, 0.0, 0.0], vec![0.9, 0.1, 0.0]],
                vec![vec![0.0, 1.0, 0.0], vec![0.1, 0.9, 0.0]],
            ],
        )
    }

    #[test]
    fn test_detect_picks_argmax_intent() {
        let index = two_intent_index();
        assert_eq!(index.detect(&[0.95, 0.05, 0.0]), Some("consumption"));
        assert_eq!(index.detect(&[0.05, 0.95, 0.0]), Some("invoice"));
    }

    #[test]
    fn test_no_intent_below_threshold() {
        let index = two_intent_index();
        // Orthogonal to both example sets.
        assert_eq!(index.detect(&[0.0, 0.0, 1.0]), None);
    }

    #[test]
    fn test_score_at_threshold_is_rejected() {
        // Single example colinear with the query scores exactly 1.0;
        // threshold 1.0 must reject it (strict >).
        let index = IntentIndex::from_parts(
            &[intent_config("consumption", 1.0, 1)],
            vec![vec![vec![1.0, 0.0]]],
        );
        assert_eq!(index.detect(&[1.0, 0.0]), None);
    }

    #[test]
    fn test_per_intent_thresholds_are_independent() {
        // Both intents see the same score; only the lax one accepts.
        let index = IntentIndex::from_parts(
            &[
                intent_config("strict", 0.99, 1),
                intent_config("lax", 0.50, 1),
            ],
            vec![
                vec![vec![1.0, 1.0, 0.0]],
                vec![vec![1.0, 1.0, 0.0]],
            ],
        );
        // Query at ~0.71 similarity to both example vectors.
        assert_eq!(index.detect(&[1.0, 0.0, 0.0]), Some("lax"));
    }

    #[test]
    fn test_per_intent_score_is_max_over_examples() {
        // First example far, second example close.
        let index = IntentIndex::from_parts(
            &[intent_config("consumption", 0.75, 2)],
            vec![vec![vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0]]],
        );
        assert_eq!(index.detect(&[0.99, 0.01, 0.0]), Some("consumption"));
    }
}
