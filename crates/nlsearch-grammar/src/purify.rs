//! Reduce a question to its informative fragment.
//!
//! Interrogative questions put the thing being asked about at the end
//! ("what is *the repository*"), so the fragment is the terminal reached by
//! following right children from the root.

use std::sync::Arc;
use tracing::debug;

use crate::cky::CkyParser;
use crate::grammar::GrammarModel;
use crate::tree::ParseTree;

/// Terminal of the rightmost leaf. May be empty.
#[must_use]
pub fn purify(tree: &ParseTree) -> &str {
    let mut node = tree;
    while let Some(right) = node.right() {
        node = right;
    }
    node.terminal().unwrap_or_default()
}

/// Split a question into parser tokens.
///
/// Runs of whitespace are collapsed; no case folding or punctuation handling.
pub fn tokenize(question: &str) -> Vec<&str> {
    question.split_whitespace().collect()
}

/// Tokenize, parse and purify in one step.
#[derive(Debug, Clone)]
pub struct QueryPurifier {
    parser: CkyParser,
}

impl QueryPurifier {
    #[must_use]
    pub fn new(grammar: Arc<GrammarModel>) -> Self {
        Self {
            parser: CkyParser::new(grammar),
        }
    }

    #[must_use]
    pub fn parser(&self) -> &CkyParser {
        &self.parser
    }

    /// Informative fragment of `question`, or `None` when it does not parse.
    ///
    /// `Some("")` means the question parsed but ends in an empty constituent.
    pub fn filter_question(&self, question: &str) -> Option<String> {
        let tokens = tokenize(question);
        let tree = self.parser.parse(&tokens)?;
        let fragment = purify(&tree);
        debug!("Purified {:?} to {:?} (p={:.3e})", question, fragment, tree.probability());
        Some(fragment.to_string())
    }
}
