//! Configuration handling for nlsearch.
//!
//! Every field has a default, so a missing or partial `config.toml` is fine.

use directories::ProjectDirs;
use nlsearch_classify::ClassifierConfig;
use nlsearch_core::Error;
use nlsearch_query::{DEFAULT_LIMIT, QueryPlanConfig};
use nlsearch_store::IndexSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Grammar configuration
    #[serde(default)]
    pub grammar: GrammarConfig,

    /// Document type classifier
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Index schema
    #[serde(default)]
    pub store: IndexSchema,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Grammar-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GrammarConfig {
    /// TOML grammar file; the built-in question grammar when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Query-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default result limit
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Plan builder fields and weights
    #[serde(flatten)]
    pub plan: QueryPlanConfig,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            plan: QueryPlanConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const SAMPLE_TOML: &str = r#"# nlsearch configuration

[grammar]
# TOML grammar file. The built-in question grammar is used when unset.
# path = "/path/to/grammar.toml"

[classifier]
# knn, naive-bayes or none
kind = "knn"
k = 1
text_field = "jcr:title"
class_field = "jcr:primaryType"

[query]
limit = 100
lexical_fields = ["jcr:title", "jcr:description", "text"]
type_field = "jcr:primaryType"
type_boost = 2.0

[store]
# Fields matched as one exact term
keyword_fields = ["jcr:primaryType", "path"]

[logging]
level = "info"
"#;

impl Config {
    /// Load from the default location, falling back to defaults when no file
    /// exists there.
    pub fn load() -> Result<Self, Error> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from `path`, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, Error> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml(&source)
    }

    /// Parse a TOML document.
    pub fn from_toml(source: &str) -> Result<Self, Error> {
        toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    /// Default config file location.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Commented configuration file with every default spelled out.
    #[must_use]
    pub fn sample_toml() -> &'static str {
        SAMPLE_TOML
    }
}

/// Get the XDG config directory for nlsearch.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("NLSEARCH_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "nlsearch").map(|dirs| dirs.config_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlsearch_classify::ClassifierKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.grammar.path, None);
        assert_eq!(config.classifier.kind, ClassifierKind::Knn);
        assert_eq!(config.query.limit, 100);
        assert_eq!(config.query.plan.type_field, "jcr:primaryType");
        assert!(config.store.is_keyword("path"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_sample_matches_defaults() {
        let config = Config::from_toml(Config::sample_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[classifier]\nkind = \"naive-bayes\"\n\n[query]\ntype_boost = 4.0"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.classifier.kind, ClassifierKind::NaiveBayes);
        assert_eq!(config.classifier.k, 1);
        assert!((config.query.plan.type_boost - 4.0).abs() < f32::EPSILON);
        assert_eq!(config.query.limit, 100);
        assert_eq!(config.query.plan.lexical_fields.len(), 3);
    }

    #[test]
    fn test_plan_fields_live_in_query_section() {
        let config = Config::from_toml(
            "[query]\nlimit = 5\nlexical_fields = [\"body\"]\ntype_field = \"kind\"",
        )
        .unwrap();
        assert_eq!(config.query.limit, 5);
        assert_eq!(config.query.plan.lexical_fields, vec!["body".to_string()]);
        assert_eq!(config.query.plan.type_field, "kind");
        assert!((config.query.plan.type_boost - 2.0).abs() < f32::EPSILON);

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("[query.plan]"));
        assert!(rendered.contains("type_field = \"kind\""));
    }

    #[test]
    fn test_grammar_path() {
        let config = Config::from_toml("[grammar]\npath = \"/etc/nlsearch/grammar.toml\"").unwrap();
        assert_eq!(
            config.grammar.path,
            Some(PathBuf::from("/etc/nlsearch/grammar.toml"))
        );
    }

    #[test]
    fn test_invalid_file() {
        let result = Config::from_toml("[query]\nlimit = \"many\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(&dir.path().join("config.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let mut config = Config::default();
        config.classifier.kind = ClassifierKind::None;
        config.grammar.path = Some(PathBuf::from("grammar.toml"));

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert_eq!(Config::from_toml(&rendered).unwrap(), config);
    }
}
