//! k-nearest-neighbour classifier.
//!
//! Documents are term-frequency vectors; similarity is cosine. The `k` most
//! similar training documents vote for their class, each vote weighted by its
//! similarity.

use nlsearch_core::{
    ClassificationResult, ClassifyError, CorpusSnapshot, DocumentClassifier, term_frequencies,
};
use std::collections::HashMap;
use tracing::debug;

/// Default number of neighbours.
pub const DEFAULT_K: usize = 1;

/// Unit-length sparse vector.
#[derive(Debug, Clone)]
struct Vector {
    weights: HashMap<String, f64>,
}

impl Vector {
    fn from_text(text: &str) -> Option<Self> {
        let freqs = term_frequencies(text);
        let norm = freqs
            .values()
            .map(|&tf| f64::from(tf) * f64::from(tf))
            .sum::<f64>()
            .sqrt();
        if norm == 0.0 {
            return None;
        }
        let weights = freqs
            .into_iter()
            .map(|(term, tf)| (term, f64::from(tf) / norm))
            .collect();
        Some(Self { weights })
    }

    fn cosine(&self, other: &Self) -> f64 {
        let (small, large) = if self.weights.len() <= other.weights.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .weights
            .iter()
            .filter_map(|(term, w)| large.weights.get(term).map(|v| w * v))
            .sum()
    }
}

#[derive(Debug, Clone)]
struct Example {
    vector: Vector,
    label: String,
}

/// Similarity-weighted k-NN over term-frequency vectors.
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    k: usize,
    examples: Vec<Example>,
    trained: bool,
}

impl Default for KnnClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl KnnClassifier {
    /// Classifier voting over the `k` nearest documents. `k` is at least 1.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            examples: Vec::new(),
            trained: false,
        }
    }

    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of documents retained from training.
    #[must_use]
    pub fn example_count(&self) -> usize {
        self.examples.len()
    }
}

impl DocumentClassifier for KnnClassifier {
    fn name(&self) -> &str {
        "knn"
    }

    fn train(
        &mut self,
        corpus: &CorpusSnapshot,
        text_field: &str,
        class_field: &str,
    ) -> Result<(), ClassifyError> {
        let mut examples = Vec::new();
        let mut labelled = 0usize;

        for doc in corpus.documents() {
            let (Some(text), Some(label)) = (doc.get(text_field), doc.get(class_field)) else {
                continue;
            };
            labelled += 1;
            if let Some(vector) = Vector::from_text(text) {
                examples.push(Example {
                    vector,
                    label: label.to_string(),
                });
            }
        }

        if labelled == 0 {
            return Err(ClassifyError::EmptyCorpus {
                text_field: text_field.to_string(),
                class_field: class_field.to_string(),
            });
        }
        if examples.is_empty() {
            return Err(ClassifyError::TrainingFailed(format!(
                "no terms in field {text_field:?} of {labelled} labelled documents"
            )));
        }

        debug!(
            "knn trained on {} of {} documents (generation {})",
            examples.len(),
            corpus.len(),
            corpus.generation()
        );
        self.examples = examples;
        self.trained = true;
        Ok(())
    }

    fn is_trained(&self) -> bool {
        self.trained
    }

    fn assign_class(&self, text: &str) -> Result<Option<ClassificationResult>, ClassifyError> {
        if !self.trained {
            return Err(ClassifyError::Untrained);
        }
        let Some(query) = Vector::from_text(text) else {
            return Ok(None);
        };

        let mut neighbours: Vec<(usize, f64)> = self
            .examples
            .iter()
            .enumerate()
            .map(|(i, example)| (i, example.vector.cosine(&query)))
            .filter(|&(_, similarity)| similarity > 0.0)
            .collect();
        // Stable: equal similarities keep training order.
        neighbours.sort_by(|a, b| b.1.total_cmp(&a.1));
        neighbours.truncate(self.k);

        // Votes in first-seen order so ties go to the nearest neighbour's class.
        let mut votes: Vec<(&str, f64)> = Vec::new();
        for &(i, similarity) in &neighbours {
            let label = self.examples[i].label.as_str();
            match votes.iter_mut().find(|(l, _)| *l == label) {
                Some((_, total)) => *total += similarity,
                None => votes.push((label, similarity)),
            }
        }

        let total: f64 = votes.iter().map(|(_, v)| v).sum();
        let best = votes
            .iter()
            .fold(None::<(&str, f64)>, |best, &(label, v)| match best {
                Some((_, top)) if top >= v => best,
                _ => Some((label, v)),
            });

        Ok(best.map(|(label, v)| ClassificationResult::new(label, v / total)))
    }
}
