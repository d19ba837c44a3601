//! Derivation trees produced by the parser.

use std::fmt;

/// Half-open token range `[start, end)`. Empty-string derivations have
/// `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Shape of a derivation node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `label -> terminal`
    Leaf { terminal: String },
    /// `label -> left right`
    Branch {
        left: Box<ParseTree>,
        right: Box<ParseTree>,
    },
}

/// A node of the best derivation found by the parser.
///
/// `probability` is the product of every rule probability used in the
/// subtree rooted here.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseTree {
    label: String,
    span: Span,
    probability: f64,
    node: Node,
}

impl ParseTree {
    #[must_use]
    pub fn leaf(
        label: impl Into<String>,
        terminal: impl Into<String>,
        span: Span,
        probability: f64,
    ) -> Self {
        Self {
            label: label.into(),
            span,
            probability,
            node: Node::Leaf {
                terminal: terminal.into(),
            },
        }
    }

    #[must_use]
    pub fn branch(label: impl Into<String>, left: ParseTree, right: ParseTree, probability: f64) -> Self {
        Self {
            label: label.into(),
            span: Span::new(left.span.start, right.span.end),
            probability,
            node: Node::Branch {
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    /// Nonterminal at this node.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self.node, Node::Leaf { .. })
    }

    /// Terminal word, for leaves.
    #[must_use]
    pub fn terminal(&self) -> Option<&str> {
        match &self.node {
            Node::Leaf { terminal } => Some(terminal),
            Node::Branch { .. } => None,
        }
    }

    #[must_use]
    pub fn left(&self) -> Option<&ParseTree> {
        match &self.node {
            Node::Branch { left, .. } => Some(left),
            Node::Leaf { .. } => None,
        }
    }

    #[must_use]
    pub fn right(&self) -> Option<&ParseTree> {
        match &self.node {
            Node::Branch { right, .. } => Some(right),
            Node::Leaf { .. } => None,
        }
    }

    /// Terminals in left-to-right order, including empty ones.
    #[must_use]
    pub fn leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(tree) = stack.pop() {
            match &tree.node {
                Node::Leaf { terminal } => out.push(terminal.as_str()),
                Node::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        out
    }

    /// Number of edges on the longest root-to-leaf path.
    #[must_use]
    pub fn depth(&self) -> usize {
        match &self.node {
            Node::Leaf { .. } => 0,
            Node::Branch { left, right } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Bracketed form: `(S (Q what) (R ...))`. Empty terminals print as `""`.
impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Node::Leaf { terminal } if terminal.is_empty() => write!(f, "({} \"\")", self.label),
            Node::Leaf { terminal } => write!(f, "({} {})", self.label, terminal),
            Node::Branch { left, right } => write!(f, "({} {} {})", self.label, left, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParseTree {
        // (NP (DT the) (NN admin))
        ParseTree::branch(
            "NP",
            ParseTree::leaf("DT", "the", Span::new(2, 3), 1.0),
            ParseTree::leaf("NN", "admin", Span::new(3, 4), 0.1),
            0.05,
        )
    }

    #[test]
    fn test_branch_span_covers_children() {
        let tree = sample();
        assert_eq!(tree.span(), Span::new(2, 4));
        assert_eq!(tree.span().len(), 2);
    }

    #[test]
    fn test_accessors() {
        let tree = sample();
        assert!(!tree.is_leaf());
        assert_eq!(tree.label(), "NP");
        assert_eq!(tree.left().and_then(ParseTree::terminal), Some("the"));
        assert_eq!(tree.right().and_then(ParseTree::terminal), Some("admin"));
        assert_eq!(tree.terminal(), None);
    }

    #[test]
    fn test_leaves_in_order() {
        assert_eq!(sample().leaves(), vec!["the", "admin"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "(NP (DT the) (NN admin))");
        let empty = ParseTree::leaf("E", "", Span::new(1, 1), 1.0);
        assert_eq!(empty.to_string(), "(E \"\")");
        assert!(empty.span().is_empty());
    }

    #[test]
    fn test_depth() {
        assert_eq!(sample().depth(), 1);
        assert_eq!(ParseTree::leaf("E", "", Span::new(0, 0), 1.0).depth(), 0);
    }
}
