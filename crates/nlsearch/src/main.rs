//! # nlsearch CLI
//!
//! Command-line interface for natural-language search over a content tree.
//!
//! A question is parsed with a probabilistic grammar, reduced to its subject,
//! classified into a likely document type and turned into a weighted term
//! query.
//!
//! ## Commands
//!
//! - `nlsearch parse <QUESTION>` - Show the best parse and the purified fragment
//! - `nlsearch plan --content <TREE> <QUESTION>` - Show the query plan
//! - `nlsearch query --content <TREE> <QUESTION>` - Run a question against a tree
//! - `nlsearch grammar show|check [FILE]` - Inspect or validate a grammar
//! - `nlsearch config show|init|path` - Manage configuration
//!
//! ## Examples
//!
//! ```bash
//! nlsearch parse "what is the repository"
//! nlsearch query --content content.json "who is the admin" --format json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nlsearch::{Config, Pipeline, load_grammar};
use nlsearch_grammar::{GrammarModel, QueryPurifier, purify, tokenize};
use nlsearch_index::ContentNode;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "nlsearch")]
#[command(about = "Natural-language search over a content tree")]
#[command(version)]
struct Cli {
    /// Path to config file (default: ~/.config/nlsearch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a question and show its purified fragment
    Parse {
        /// Question text
        question: String,
    },

    /// Show the query plan for a question
    Plan {
        /// JSON content tree to classify against
        #[arg(long)]
        content: PathBuf,

        /// Question text
        question: String,
    },

    /// Run a question against a content tree
    Query {
        /// JSON content tree to index
        #[arg(long)]
        content: PathBuf,

        /// Question text
        question: String,

        /// Maximum results (default: from config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Inspect the question grammar
    Grammar {
        #[command(subcommand)]
        action: GrammarAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum GrammarAction {
    /// Print a grammar definition as TOML
    Show {
        /// Grammar file (default: configured grammar)
        file: Option<PathBuf>,
    },
    /// Validate a grammar definition
    Check {
        /// Grammar file (default: configured grammar)
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for `parse`.
#[derive(Serialize)]
struct ParseOutput {
    question: String,
    tokens: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fragment: Option<String>,
}

/// Output structure for `query`.
#[derive(Serialize)]
struct QueryOutput {
    question: String,
    plan: String,
    results: Vec<ResultItem>,
}

#[derive(Serialize)]
struct ResultItem {
    path: String,
    score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_type: Option<String>,
}

/// Output structure for `grammar check`.
#[derive(Serialize)]
struct GrammarSummary {
    start: String,
    nonterminals: usize,
    terminals: usize,
    rules: usize,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Config::load().context("Failed to load config"),
    }
}

fn grammar_from(file: Option<&Path>, config: &Config) -> Result<GrammarModel> {
    match file {
        Some(path) => GrammarModel::from_file(path)
            .with_context(|| format!("Invalid grammar {}", path.display())),
        None => load_grammar(&config.grammar).context("Failed to load grammar"),
    }
}

async fn open_pipeline(config: &Config, content: &Path) -> Result<Pipeline> {
    let tree = ContentNode::from_file(content)
        .with_context(|| format!("Failed to read content tree {}", content.display()))?;
    debug!("Content tree has {} nodes", tree.node_count());

    Pipeline::open(config, &tree)
        .await
        .context("Failed to index content tree")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config
            .logging
            .level
            .parse::<Level>()
            .with_context(|| format!("Invalid log level {:?}", config.logging.level))?
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Parse { question } => {
            let grammar = grammar_from(None, &config)?;
            let purifier = QueryPurifier::new(Arc::new(grammar));
            let tokens = tokenize(&question);
            let tree = purifier.parser().parse(&tokens);

            let output = ParseOutput {
                question: question.clone(),
                tokens: tokens.iter().map(ToString::to_string).collect(),
                tree: tree.as_ref().map(ToString::to_string),
                probability: tree.as_ref().map(|t| t.probability()),
                fragment: tree.as_ref().map(|t| purify(t).to_string()),
            };

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => match (&output.tree, output.probability, &output.fragment) {
                    (Some(tree), Some(probability), Some(fragment)) => {
                        println!("Tree:        {tree}");
                        println!("Probability: {probability:.6}");
                        println!("Fragment:    {fragment:?}");
                    }
                    _ => println!("No parse for {question:?}"),
                },
            }
        }

        Commands::Plan { content, question } => {
            let pipeline = open_pipeline(&config, &content).await?;
            let translation = pipeline.executor().translate(&question).await;

            match cli.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&translation)?);
                }
                OutputFormat::Text => {
                    match &translation.fragment {
                        Some(fragment) => println!("Fragment: {fragment:?}"),
                        None => println!("Fragment: (no parse)"),
                    }
                    match &translation.classification {
                        Some(result) => {
                            println!("Type:     {} ({:.3})", result.label, result.score);
                        }
                        None => println!("Type:     (none)"),
                    }
                    println!("Plan:     {}", translation.plan);
                }
            }
        }

        Commands::Query {
            content,
            question,
            limit,
        } => {
            let pipeline = open_pipeline(&config, &content).await?;
            let executor = pipeline.executor();
            let limit = limit.unwrap_or(executor.limit());

            let (translation, cursor) = executor
                .execute_explained(&question, limit)
                .await
                .context("Query execution failed")?;
            let plan = translation.plan;

            let results: Vec<ResultItem> = cursor
                .map(|row| ResultItem {
                    path: row.path().to_string(),
                    score: row.score(),
                    title: row.value(nlsearch_core::TITLE_FIELD),
                    primary_type: row.value(nlsearch_core::TYPE_FIELD),
                })
                .collect();

            match cli.format {
                OutputFormat::Json => {
                    let output = QueryOutput {
                        question: question.clone(),
                        plan: plan.to_string(),
                        results,
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Text => {
                    println!("Question: {question}");
                    println!("Plan:     {plan}\n");
                    if results.is_empty() {
                        println!("No results found.");
                    } else {
                        for (i, result) in results.iter().enumerate() {
                            println!("{}. {} (score: {:.3})", i + 1, result.path, result.score);
                            if let Some(ref primary_type) = result.primary_type {
                                println!("   Type:  {primary_type}");
                            }
                            if let Some(ref title) = result.title {
                                println!("   Title: {title}");
                            }
                        }
                    }
                }
            }
        }

        Commands::Grammar { action } => match action {
            GrammarAction::Show { file } => {
                let grammar = grammar_from(file.as_deref(), &config)?;
                let definition = grammar.definition();
                match cli.format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&definition)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{}",
                            definition
                                .to_toml()
                                .context("Failed to serialize grammar")?
                        );
                    }
                }
            }
            GrammarAction::Check { file } => {
                let grammar = grammar_from(file.as_deref(), &config)?;
                let summary = GrammarSummary {
                    start: grammar.start_symbol().to_string(),
                    nonterminals: grammar.nonterminals().len(),
                    terminals: grammar.terminals().len(),
                    rules: grammar.rules().len(),
                };
                match cli.format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&summary)?);
                    }
                    OutputFormat::Text => {
                        println!("Grammar OK");
                        println!("  Start:        {}", summary.start);
                        println!("  Nonterminals: {}", summary.nonterminals);
                        println!("  Terminals:    {}", summary.terminals);
                        println!("  Rules:        {}", summary.rules);
                    }
                }
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}
