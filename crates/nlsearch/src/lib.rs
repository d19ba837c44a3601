//! # nlsearch
//!
//! Configuration and pipeline wiring shared by the `nlsearch` binary and its
//! integration tests.

pub mod config;
pub mod pipeline;

pub use config::{Config, GrammarConfig, LoggingConfig, QueryConfig, config_dir};
pub use pipeline::{Pipeline, load_grammar};
