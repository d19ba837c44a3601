//! Error types for nlsearch.
//!
//! Only [`GrammarError`] is fatal, and only at startup. The rest are
//! recoverable: a classifier fault drops the boost clause, and a backend fault
//! surfaces to the caller instead of turning into an empty cursor. A failed
//! parse is not an error at all (see `nlsearch_grammar::CkyParser::parse`).

use thiserror::Error;

/// Main error type for nlsearch operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Grammar construction failed
    #[error("invalid grammar: {0}")]
    Grammar(#[from] GrammarError),

    /// Classifier training or inference failed
    #[error("classifier error: {0}")]
    Classify(#[from] ClassifyError),

    /// Retrieval backend operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Result cursor misuse
    #[error("cursor error: {0}")]
    Cursor(#[from] CursorError),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Ill-formed grammar definitions, reported by eager validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrammarError {
    #[error("start symbol {0:?} is not a declared nonterminal")]
    UnknownStartSymbol(String),

    #[error("rule {rule}: {symbol:?} is not a declared nonterminal")]
    UnknownNonterminal { rule: String, symbol: String },

    #[error("rule {rule}: {symbol:?} is not a declared terminal")]
    UnknownTerminal { rule: String, symbol: String },

    #[error("rule {rule} is not in Chomsky normal form: {reason}")]
    NotChomskyNormalForm { rule: String, reason: String },

    #[error("rule {rule} has probability {probability}, expected a value in (0, 1]")]
    InvalidProbability { rule: String, probability: f64 },

    #[error("rule {0} is defined more than once")]
    DuplicateRule(String),

    #[error("symbol {0:?} is declared as both terminal and nonterminal")]
    AmbiguousSymbol(String),

    #[error("failed to read grammar definition: {0}")]
    Definition(String),
}

/// Classifier errors. All of them degrade a query to "no boost".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("classifier has not been trained")]
    Untrained,

    #[error("no training examples with fields {text_field:?} and {class_field:?}")]
    EmptyCorpus {
        text_field: String,
        class_field: String,
    },

    #[error("training failed: {0}")]
    TrainingFailed(String),

    #[error("corpus unavailable: {0}")]
    Backend(String),
}

/// Retrieval backend errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("index writer already held")]
    WriterLocked,

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Result cursor errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CursorError {
    #[error("cursor position {position} out of range for {len} hits")]
    OutOfRange { position: usize, len: usize },
}

/// Result type alias for nlsearch operations.
pub type Result<T> = std::result::Result<T, Error>;
