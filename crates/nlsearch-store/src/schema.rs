//! Field analysis rules for the memory index.

use nlsearch_core::{Document, PATH_FIELD, TYPE_FIELD, term_frequencies};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// How document fields are turned into terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Fields indexed as one exact term instead of analyzed text
    #[serde(default = "default_keyword_fields")]
    pub keyword_fields: BTreeSet<String>,
}

fn default_keyword_fields() -> BTreeSet<String> {
    [PATH_FIELD, TYPE_FIELD].iter().map(ToString::to_string).collect()
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self {
            keyword_fields: default_keyword_fields(),
        }
    }
}

impl IndexSchema {
    #[must_use]
    pub fn with_keyword_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keyword_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn is_keyword(&self, field: &str) -> bool {
        self.keyword_fields.contains(field)
    }

    /// Terms of every field of `document`, including its path.
    pub(crate) fn terms(&self, document: &Document) -> HashMap<String, FieldTerms> {
        let mut fields = HashMap::with_capacity(document.fields.len() + 1);
        fields.insert(PATH_FIELD.to_string(), self.field_terms(PATH_FIELD, &document.path));
        for (name, value) in &document.fields {
            fields.insert(name.clone(), self.field_terms(name, value));
        }
        fields
    }

    fn field_terms(&self, field: &str, value: &str) -> FieldTerms {
        if self.is_keyword(field) {
            FieldTerms {
                frequencies: HashMap::from([(value.to_string(), 1)]),
                length: 1,
            }
        } else {
            let frequencies = term_frequencies(value);
            let length = frequencies.values().sum();
            FieldTerms {
                frequencies,
                length,
            }
        }
    }
}

/// Term frequencies of one field value.
#[derive(Debug, Clone, Default)]
pub(crate) struct FieldTerms {
    pub frequencies: HashMap<String, u32>,
    /// Number of tokens in the field
    pub length: u32,
}

impl FieldTerms {
    pub fn frequency(&self, term: &str) -> u32 {
        self.frequencies.get(term).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_keyword_fields() {
        let schema = IndexSchema::default();
        assert!(schema.is_keyword("path"));
        assert!(schema.is_keyword("jcr:primaryType"));
        assert!(!schema.is_keyword("jcr:title"));
    }

    #[test]
    fn test_keyword_field_is_one_term() {
        let schema = IndexSchema::default();
        let doc = Document::new("/a/b").with_field("jcr:primaryType", "nt:unstructured");
        let terms = schema.terms(&doc);

        let kind = &terms["jcr:primaryType"];
        assert_eq!(kind.frequency("nt:unstructured"), 1);
        assert_eq!(kind.frequency("nt"), 0);
        assert_eq!(kind.length, 1);
        assert_eq!(terms["path"].frequency("/a/b"), 1);
    }

    #[test]
    fn test_text_field_is_analyzed() {
        let schema = IndexSchema::default();
        let doc = Document::new("/n").with_field("jcr:description", "a repository is quite a thing");
        let terms = schema.terms(&doc);

        let description = &terms["jcr:description"];
        assert_eq!(description.frequency("a"), 2);
        assert_eq!(description.frequency("repository"), 1);
        assert_eq!(description.length, 6);
    }

    #[test]
    fn test_custom_keyword_fields() {
        let schema = IndexSchema::with_keyword_fields(["sling:resourceType"]);
        assert!(schema.is_keyword("sling:resourceType"));
        assert!(!schema.is_keyword("path"));
    }
}
