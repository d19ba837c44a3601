//! Viterbi CKY parsing.
//!
//! The chart keeps a single best entry per (span, nonterminal). Entries store
//! compact back references; the [`ParseTree`] is materialized only for the
//! winning start-symbol entry, and the chart is dropped when `parse` returns.
//!
//! Scores are natural-log probabilities, so long inputs compare correctly
//! where plain products would underflow to zero.
//!
//! Empty-string productions (`E -> ""`) are supported through a closure step:
//! once a span is filled, a rule `A -> B C` whose `C` (or `B`) derives the
//! empty string may cover the same span as `B` (or `C`) alone, with an empty
//! child at the span boundary.

use std::sync::Arc;
use tracing::trace;

use crate::grammar::{Body, GrammarModel, SymbolId};
use crate::tree::{ParseTree, Span};

#[derive(Debug, Clone, Copy)]
enum Back {
    /// `A -> token`
    Terminal { rule: usize },
    /// `A -> B C` with `B` over the first `split` tokens
    Split { rule: usize, split: usize },
    /// `A -> B C`, `B` derives the empty string at the span start
    EmptyLeft { rule: usize },
    /// `A -> B C`, `C` derives the empty string at the span end
    EmptyRight { rule: usize },
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    /// `ln` of the derivation probability
    score: f64,
    back: Back,
}

/// Triangular chart indexed by (start, length), one slot per nonterminal.
///
/// Spans of each length are stored contiguously, shortest first, for
/// `n(n+1)/2` spans in total.
struct Chart {
    n: usize,
    symbols: usize,
    cells: Vec<Option<Entry>>,
}

impl Chart {
    fn new(n: usize, symbols: usize) -> Self {
        Self {
            n,
            symbols,
            cells: vec![None; n * (n + 1) / 2 * symbols],
        }
    }

    fn offset(&self, start: usize, len: usize, symbol: SymbolId) -> usize {
        debug_assert!(len >= 1 && start + len <= self.n);
        let shorter = len - 1;
        let row = shorter * (self.n + 1) - shorter * len / 2;
        (row + start) * self.symbols + symbol
    }

    fn get(&self, start: usize, len: usize, symbol: SymbolId) -> Option<Entry> {
        self.cells[self.offset(start, len, symbol)]
    }

    /// Keep `entry` if it strictly beats the current one. Returns whether it did.
    fn offer(&mut self, start: usize, len: usize, symbol: SymbolId, entry: Entry) -> bool {
        let offset = self.offset(start, len, symbol);
        let slot = &mut self.cells[offset];
        if slot.is_none_or(|current| entry.score > current.score) {
            *slot = Some(entry);
            true
        } else {
            false
        }
    }

    /// Symbols with an entry over the span, in declaration order.
    fn filled(&self, start: usize, len: usize) -> Vec<(SymbolId, f64)> {
        (0..self.symbols)
            .filter_map(|symbol| {
                self.get(start, len, symbol)
                    .map(|entry| (symbol, entry.score))
            })
            .collect()
    }
}

/// Probabilistic CKY parser over a shared [`GrammarModel`].
///
/// Parsing is pure: one parser can serve any number of concurrent callers.
#[derive(Debug, Clone)]
pub struct CkyParser {
    grammar: Arc<GrammarModel>,
}

impl CkyParser {
    #[must_use]
    pub fn new(grammar: Arc<GrammarModel>) -> Self {
        Self { grammar }
    }

    #[must_use]
    pub fn grammar(&self) -> &GrammarModel {
        &self.grammar
    }

    /// Most probable derivation of `tokens` from the start symbol.
    ///
    /// Returns `None` when no derivation exists, which is the normal outcome
    /// for ungrammatical or out-of-vocabulary input.
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Option<ParseTree> {
        let grammar = &*self.grammar;
        let start = grammar.start_id();
        let n = tokens.len();

        if n == 0 {
            return self.build_empty(start, 0);
        }

        // Every token must be a leaf of some terminal rule.
        if let Some(unknown) = tokens
            .iter()
            .position(|token| grammar.terminal_rule_ids(token.as_ref()).is_empty())
        {
            trace!("No terminal rule for token {} of {}", unknown, n);
            return None;
        }

        let mut chart = Chart::new(n, grammar.nonterminals().len());

        for (i, token) in tokens.iter().enumerate() {
            for &index in grammar.terminal_rule_ids(token.as_ref()) {
                let rule = grammar.rule_at(index);
                chart.offer(
                    i,
                    1,
                    rule.lhs_id(),
                    Entry {
                        score: rule.log_probability(),
                        back: Back::Terminal { rule: index },
                    },
                );
            }
            self.close_over_empty(&mut chart, i, 1);
        }

        for len in 2..=n {
            for begin in 0..=(n - len) {
                for split in 1..len {
                    let left = chart.filled(begin, split);
                    if left.is_empty() {
                        continue;
                    }
                    let right = chart.filled(begin + split, len - split);
                    for &(b, left_score) in &left {
                        for &(c, right_score) in &right {
                            for &index in grammar.pair_rule_ids(b, c) {
                                let rule = grammar.rule_at(index);
                                chart.offer(
                                    begin,
                                    len,
                                    rule.lhs_id(),
                                    Entry {
                                        score: rule.log_probability() + left_score + right_score,
                                        back: Back::Split { rule: index, split },
                                    },
                                );
                            }
                        }
                    }
                }
                self.close_over_empty(&mut chart, begin, len);
            }
        }

        let tree = self.build(&chart, 0, n, start);
        if tree.is_none() {
            trace!("No derivation for {} tokens", n);
        }
        tree
    }

    /// Relax `A -> B C` rules with one nullable side until the span is stable.
    fn close_over_empty(&self, chart: &mut Chart, begin: usize, len: usize) {
        let grammar = &*self.grammar;
        for _ in 0..=grammar.nonterminals().len() {
            let mut changed = false;
            for &index in grammar.binary_rule_ids() {
                let rule = grammar.rule_at(index);
                let Body::Binary(b, c) = rule.body() else {
                    continue;
                };
                if let (Some(left), Some(null)) =
                    (chart.get(begin, len, b), grammar.null_derivation(c))
                {
                    changed |= chart.offer(
                        begin,
                        len,
                        rule.lhs_id(),
                        Entry {
                            score: rule.log_probability() + left.score + null.log_probability,
                            back: Back::EmptyRight { rule: index },
                        },
                    );
                }
                if let (Some(null), Some(right)) =
                    (grammar.null_derivation(b), chart.get(begin, len, c))
                {
                    changed |= chart.offer(
                        begin,
                        len,
                        rule.lhs_id(),
                        Entry {
                            score: rule.log_probability() + null.log_probability + right.score,
                            back: Back::EmptyLeft { rule: index },
                        },
                    );
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn build(&self, chart: &Chart, begin: usize, len: usize, symbol: SymbolId) -> Option<ParseTree> {
        let grammar = &*self.grammar;
        let entry = chart.get(begin, len, symbol)?;
        let label = grammar.symbol_name(symbol);
        let probability = entry.score.exp();

        match entry.back {
            Back::Terminal { rule } => {
                let terminal = grammar.rule_at(rule).terminal()?;
                Some(ParseTree::leaf(
                    label,
                    terminal,
                    Span::new(begin, begin + len),
                    probability,
                ))
            }
            Back::Split { rule, split } => {
                let (b, c) = binary_children(grammar, rule)?;
                let left = self.build(chart, begin, split, b)?;
                let right = self.build(chart, begin + split, len - split, c)?;
                Some(ParseTree::branch(label, left, right, probability))
            }
            Back::EmptyRight { rule } => {
                let (b, c) = binary_children(grammar, rule)?;
                let left = self.build(chart, begin, len, b)?;
                let right = self.build_empty(c, begin + len)?;
                Some(ParseTree::branch(label, left, right, probability))
            }
            Back::EmptyLeft { rule } => {
                let (b, c) = binary_children(grammar, rule)?;
                let left = self.build_empty(b, begin)?;
                let right = self.build(chart, begin, len, c)?;
                Some(ParseTree::branch(label, left, right, probability))
            }
        }
    }

    /// Best empty-string derivation of `symbol`, anchored at token `at`.
    fn build_empty(&self, symbol: SymbolId, at: usize) -> Option<ParseTree> {
        let grammar = &*self.grammar;
        let null = grammar.null_derivation(symbol)?;
        let label = grammar.symbol_name(symbol);
        let rule = grammar.rule_at(null.rule);
        let probability = null.log_probability.exp();

        match rule.body() {
            Body::Terminal => Some(ParseTree::leaf(
                label,
                rule.terminal()?,
                Span::new(at, at),
                probability,
            )),
            Body::Binary(b, c) => {
                let left = self.build_empty(b, at)?;
                let right = self.build_empty(c, at)?;
                Some(ParseTree::branch(label, left, right, probability))
            }
        }
    }
}

fn binary_children(grammar: &GrammarModel, rule: usize) -> Option<(SymbolId, SymbolId)> {
    match grammar.rule_at(rule).body() {
        Body::Binary(b, c) => Some((b, c)),
        Body::Terminal => None,
    }
}
