//! # nlsearch-grammar
//!
//! Probabilistic context-free grammars and question purification.
//!
//! ## Components
//!
//! - [`GrammarModel`]: validated PCFG in Chomsky normal form
//! - [`CkyParser`]: Viterbi CKY parser with empty-string support
//! - [`QueryPurifier`]: question to informative fragment
//! - [`question_grammar`]: built-in grammar for short English questions
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use nlsearch_grammar::{question_grammar, QueryPurifier};
//!
//! let purifier = QueryPurifier::new(Arc::new(question_grammar()?));
//! assert_eq!(purifier.filter_question("who is the admin").as_deref(), Some("admin"));
//! ```

pub mod cky;
pub mod grammar;
pub mod purify;
pub mod questions;
pub mod tree;

pub use cky::CkyParser;
pub use grammar::{GrammarDefinition, GrammarModel, Rhs, Rule, RuleDefinition, SymbolId, WeightedRule};
pub use purify::{QueryPurifier, purify, tokenize};
pub use questions::{question_grammar, question_grammar_definition};
pub use tree::{Node, ParseTree, Span};
