//! Multinomial naive Bayes with Laplace smoothing.

use nlsearch_core::{
    ClassificationResult, ClassifyError, CorpusSnapshot, DocumentClassifier, analyze,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
struct ClassStats {
    documents: u32,
    terms: HashMap<String, u32>,
    total_terms: u64,
}

/// Multinomial naive Bayes over analyzed tokens.
///
/// Scoring happens in log space; the reported score is the posterior of the
/// winning class normalized over all classes.
#[derive(Debug, Clone, Default)]
pub struct NaiveBayesClassifier {
    classes: BTreeMap<String, ClassStats>,
    vocabulary: HashSet<String>,
    documents: u32,
    trained: bool,
}

impl NaiveBayesClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct class labels seen in training, sorted.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

impl DocumentClassifier for NaiveBayesClassifier {
    fn name(&self) -> &str {
        "naive-bayes"
    }

    fn train(
        &mut self,
        corpus: &CorpusSnapshot,
        text_field: &str,
        class_field: &str,
    ) -> Result<(), ClassifyError> {
        let mut classes: BTreeMap<String, ClassStats> = BTreeMap::new();
        let mut vocabulary = HashSet::new();
        let mut documents = 0u32;

        for doc in corpus.documents() {
            let (Some(text), Some(label)) = (doc.get(text_field), doc.get(class_field)) else {
                continue;
            };
            documents += 1;
            let stats = classes.entry(label.to_string()).or_default();
            stats.documents += 1;
            for token in analyze(text) {
                stats.total_terms += 1;
                *stats.terms.entry(token.clone()).or_insert(0) += 1;
                vocabulary.insert(token);
            }
        }

        if documents == 0 {
            return Err(ClassifyError::EmptyCorpus {
                text_field: text_field.to_string(),
                class_field: class_field.to_string(),
            });
        }
        if vocabulary.is_empty() {
            return Err(ClassifyError::TrainingFailed(format!(
                "no terms in field {text_field:?} of {documents} labelled documents"
            )));
        }

        debug!(
            "naive-bayes trained: {} classes, {} terms, {} documents (generation {})",
            classes.len(),
            vocabulary.len(),
            documents,
            corpus.generation()
        );
        self.classes = classes;
        self.vocabulary = vocabulary;
        self.documents = documents;
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

        let tokens: Vec<String> = analyze(text)
            .into_iter()
            .filter(|token| self.vocabulary.contains(token))
            .collect();
        if tokens.is_empty() {
            return Ok(None);
        }

        let vocabulary = self.vocabulary.len() as f64;
        let total_documents = f64::from(self.documents);
        let log_posteriors: Vec<(&str, f64)> = self
            .classes
            .iter()
            .map(|(label, stats)| {
                let denominator = (stats.total_terms as f64 + vocabulary).ln();
                let likelihood: f64 = tokens
                    .iter()
                    .map(|token| {
                        let count = stats.terms.get(token).copied().unwrap_or(0);
                        (f64::from(count) + 1.0).ln() - denominator
                    })
                    .sum();
                let prior = (f64::from(stats.documents) / total_documents).ln();
                (label.as_str(), prior + likelihood)
            })
            .collect();

        // Ties keep the first label in sorted order.
        let Some(&(label, best)) = log_posteriors
            .iter()
            .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        else {
            return Ok(None);
        };

        let normalizer: f64 = log_posteriors
            .iter()
            .map(|(_, log_p)| (log_p - best).exp())
            .sum();
        Ok(Some(ClassificationResult::new(label, 1.0 / normalizer)))
    }
}
