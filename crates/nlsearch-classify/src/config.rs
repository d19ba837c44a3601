//! Classifier selection.

use nlsearch_core::{DocumentClassifier, TITLE_FIELD, TYPE_FIELD};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::bayes::NaiveBayesClassifier;
use crate::knn::{DEFAULT_K, KnnClassifier};

/// Which classifier boosts queries with a predicted document type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    #[default]
    Knn,
    NaiveBayes,
    /// No type boost
    None,
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Knn => "knn",
            Self::NaiveBayes => "naive-bayes",
            Self::None => "none",
        })
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "knn" => Ok(Self::Knn),
            "naive-bayes" | "bayes" => Ok(Self::NaiveBayes),
            "none" => Ok(Self::None),
            other => Err(format!("unknown classifier kind: {other}")),
        }
    }
}

/// Classifier choice and the fields it learns from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub kind: ClassifierKind,

    /// Neighbours consulted by k-NN
    #[serde(default = "default_k")]
    pub k: usize,

    /// Field holding the training text
    #[serde(default = "default_text_field")]
    pub text_field: String,

    /// Field holding the class label
    #[serde(default = "default_class_field")]
    pub class_field: String,
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_text_field() -> String {
    TITLE_FIELD.to_string()
}

fn default_class_field() -> String {
    TYPE_FIELD.to_string()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::default(),
            k: default_k(),
            text_field: default_text_field(),
            class_field: default_class_field(),
        }
    }
}

impl ClassifierConfig {
    #[must_use]
    pub fn with_kind(mut self, kind: ClassifierKind) -> Self {
        self.kind = kind;
        self
    }

    /// Fresh, untrained classifier for this configuration.
    ///
    /// Returns `None` for [`ClassifierKind::None`].
    #[must_use]
    pub fn build(&self) -> Option<Box<dyn DocumentClassifier>> {
        match self.kind {
            ClassifierKind::Knn => Some(Box::new(KnnClassifier::new(self.k))),
            ClassifierKind::NaiveBayes => Some(Box::new(NaiveBayesClassifier::new())),
            ClassifierKind::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.kind, ClassifierKind::Knn);
        assert_eq!(config.k, 1);
        assert_eq!(config.text_field, "jcr:title");
        assert_eq!(config.class_field, "jcr:primaryType");
    }

    #[test]
    fn test_kind_parse_and_display() {
        for kind in [ClassifierKind::Knn, ClassifierKind::NaiveBayes, ClassifierKind::None] {
            assert_eq!(kind.to_string().parse::<ClassifierKind>(), Ok(kind));
        }
        assert!("svm".parse::<ClassifierKind>().is_err());
    }

    #[test]
    fn test_kind_serde_is_kebab_case() {
        let json = serde_json::to_string(&ClassifierKind::NaiveBayes).unwrap();
        assert_eq!(json, "\"naive-bayes\"");
    }

    #[test]
    fn test_build() {
        let config = ClassifierConfig::default();
        assert_eq!(config.build().map(|c| c.name().to_string()), Some("knn".to_string()));

        let config = config.with_kind(ClassifierKind::NaiveBayes);
        assert_eq!(
            config.build().map(|c| c.name().to_string()),
            Some("naive-bayes".to_string())
        );

        assert!(config.with_kind(ClassifierKind::None).build().is_none());
    }
}
