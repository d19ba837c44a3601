//! # nlsearch-classify
//!
//! Document-type classifiers for nlsearch.
//!
//! A classifier learns, from the indexed documents, which document type
//! (`jcr:primaryType`) tends to go with which words (`jcr:title`). At query
//! time its prediction becomes a boosted type clause.
//!
//! - [`KnnClassifier`]: similarity-weighted k nearest neighbours
//! - [`NaiveBayesClassifier`]: multinomial naive Bayes
//! - [`ClassifierCache`]: trains lazily, once per index generation

pub mod bayes;
pub mod cache;
pub mod config;
pub mod knn;

pub use bayes::NaiveBayesClassifier;
pub use cache::ClassifierCache;
pub use config::{ClassifierConfig, ClassifierKind};
pub use knn::{DEFAULT_K, KnnClassifier};
