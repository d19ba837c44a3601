//! Probabilistic context-free grammar in Chomsky normal form.
//!
//! A [`GrammarModel`] is built once from a [`GrammarDefinition`], validated
//! eagerly, and never mutated afterwards. Rules keep their definition order,
//! which is also the parser's tie-break order.

use nlsearch_core::GrammarError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Index of a nonterminal in declaration order.
pub type SymbolId = usize;

// ============================================================================
// Rules
// ============================================================================

/// Right-hand side of a CNF rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rhs {
    /// `A -> "word"` (the word may be empty)
    Terminal(String),
    /// `A -> B C`
    Binary(String, String),
}

/// A production without its probability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    pub lhs: String,
    pub rhs: Rhs,
}

impl Rule {
    #[must_use]
    pub fn terminal(lhs: impl Into<String>, terminal: impl Into<String>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: Rhs::Terminal(terminal.into()),
        }
    }

    #[must_use]
    pub fn binary(lhs: impl Into<String>, left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: Rhs::Binary(left.into(), right.into()),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rhs {
            Rhs::Terminal(word) => write!(f, "{} -> {:?}", self.lhs, word),
            Rhs::Binary(left, right) => write!(f, "{} -> {} {}", self.lhs, left, right),
        }
    }
}

/// Resolved right-hand side, by symbol id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Body {
    Terminal,
    Binary(SymbolId, SymbolId),
}

/// A validated rule together with its probability.
#[derive(Debug, Clone)]
pub struct WeightedRule {
    rule: Rule,
    probability: f64,
    log_probability: f64,
    lhs: SymbolId,
    body: Body,
}

impl WeightedRule {
    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Natural log of [`probability`](Self::probability).
    #[must_use]
    pub fn log_probability(&self) -> f64 {
        self.log_probability
    }

    /// Id of the left-hand nonterminal.
    #[must_use]
    pub fn lhs_id(&self) -> SymbolId {
        self.lhs
    }

    pub(crate) fn body(&self) -> Body {
        self.body
    }

    /// Terminal word, for `A -> "word"` rules.
    #[must_use]
    pub fn terminal(&self) -> Option<&str> {
        match &self.rule.rhs {
            Rhs::Terminal(word) => Some(word),
            Rhs::Binary(..) => None,
        }
    }
}

// ============================================================================
// Serializable definition
// ============================================================================

/// Serializable grammar description, e.g. loaded from TOML.
///
/// ```toml
/// start = "S"
/// nonterminals = ["S", "Q", "E"]
/// terminals = ["what", ""]
///
/// [[rules]]
/// lhs = "S"
/// rhs = ["Q", "E"]
/// probability = 1.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarDefinition {
    pub start: String,
    pub nonterminals: Vec<String>,
    pub terminals: Vec<String>,
    #[serde(default)]
    pub rules: Vec<RuleDefinition>,
}

/// One production in a [`GrammarDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub lhs: String,
    /// One terminal, or two nonterminals
    pub rhs: Vec<String>,
    pub probability: f64,
}

impl RuleDefinition {
    #[must_use]
    pub fn new(lhs: &str, rhs: &[&str], probability: f64) -> Self {
        Self {
            lhs: lhs.to_string(),
            rhs: rhs.iter().map(ToString::to_string).collect(),
            probability,
        }
    }

    fn describe(&self) -> String {
        let rhs: Vec<String> = self.rhs.iter().map(|s| format!("{s:?}")).collect();
        format!("{} -> {}", self.lhs, rhs.join(" "))
    }
}

impl GrammarDefinition {
    /// Parse a TOML grammar definition.
    pub fn from_toml(source: &str) -> Result<Self, GrammarError> {
        toml::from_str(source).map_err(|e| GrammarError::Definition(e.to_string()))
    }

    /// Read a TOML grammar definition from disk.
    pub fn from_file(path: &Path) -> Result<Self, GrammarError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| GrammarError::Definition(format!("{}: {e}", path.display())))?;
        Self::from_toml(&source)
    }

    /// Check every rule without keeping the built model.
    pub fn validate(&self) -> Result<(), GrammarError> {
        GrammarModel::new(self).map(|_| ())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, GrammarError> {
        toml::to_string_pretty(self).map_err(|e| GrammarError::Definition(e.to_string()))
    }
}

// ============================================================================
// Model
// ============================================================================

/// Best derivation of the empty string from one nonterminal.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NullDerivation {
    /// `ln` of the derivation probability
    pub log_probability: f64,
    /// Rule applied at the root of the derivation
    pub rule: usize,
}

/// Immutable, validated PCFG.
#[derive(Debug, Clone)]
pub struct GrammarModel {
    start: SymbolId,
    nonterminals: Vec<String>,
    nonterminal_ids: HashMap<String, SymbolId>,
    terminals: Vec<String>,
    rules: Vec<WeightedRule>,
    by_terminal: HashMap<String, Vec<usize>>,
    by_pair: HashMap<(SymbolId, SymbolId), Vec<usize>>,
    binary_rules: Vec<usize>,
    nullable: Vec<Option<NullDerivation>>,
}

impl GrammarModel {
    /// Validate `definition` and build the lookup tables.
    pub fn new(definition: &GrammarDefinition) -> Result<Self, GrammarError> {
        let nonterminal_ids: HashMap<String, SymbolId> = definition
            .nonterminals
            .iter()
            .enumerate()
            .map(|(id, name)| (name.clone(), id))
            .collect();
        let terminal_set: HashSet<&str> = definition.terminals.iter().map(String::as_str).collect();

        if let Some(symbol) = definition
            .terminals
            .iter()
            .find(|t| nonterminal_ids.contains_key(t.as_str()))
        {
            return Err(GrammarError::AmbiguousSymbol(symbol.clone()));
        }

        let start = *nonterminal_ids
            .get(&definition.start)
            .ok_or_else(|| GrammarError::UnknownStartSymbol(definition.start.clone()))?;

        let mut rules = Vec::with_capacity(definition.rules.len());
        let mut seen = HashSet::new();

        for def in &definition.rules {
            let name = def.describe();

            let lhs = *nonterminal_ids.get(&def.lhs).ok_or_else(|| {
                GrammarError::UnknownNonterminal {
                    rule: name.clone(),
                    symbol: def.lhs.clone(),
                }
            })?;

            if !(def.probability.is_finite() && def.probability > 0.0 && def.probability <= 1.0) {
                return Err(GrammarError::InvalidProbability {
                    rule: name,
                    probability: def.probability,
                });
            }

            let (rule, body) = match def.rhs.as_slice() {
                [symbol] => {
                    if nonterminal_ids.contains_key(symbol) {
                        return Err(GrammarError::NotChomskyNormalForm {
                            rule: name,
                            reason: "unary rule rewrites to a nonterminal".to_string(),
                        });
                    }
                    if !terminal_set.contains(symbol.as_str()) {
                        return Err(GrammarError::UnknownTerminal {
                            rule: name,
                            symbol: symbol.clone(),
                        });
                    }
                    (Rule::terminal(&def.lhs, symbol), Body::Terminal)
                }
                [left, right] => {
                    let mut ids = [0; 2];
                    for (slot, symbol) in ids.iter_mut().zip([left, right]) {
                        if terminal_set.contains(symbol.as_str()) {
                            return Err(GrammarError::NotChomskyNormalForm {
                                rule: name,
                                reason: format!("binary rule contains terminal {symbol:?}"),
                            });
                        }
                        *slot = *nonterminal_ids.get(symbol).ok_or_else(|| {
                            GrammarError::UnknownNonterminal {
                                rule: name.clone(),
                                symbol: symbol.clone(),
                            }
                        })?;
                    }
                    (
                        Rule::binary(&def.lhs, left, right),
                        Body::Binary(ids[0], ids[1]),
                    )
                }
                other => {
                    return Err(GrammarError::NotChomskyNormalForm {
                        rule: name,
                        reason: format!("{} right-hand symbols, expected 1 or 2", other.len()),
                    });
                }
            };

            if !seen.insert(rule.clone()) {
                return Err(GrammarError::DuplicateRule(rule.to_string()));
            }

            rules.push(WeightedRule {
                rule,
                probability: def.probability,
                log_probability: def.probability.ln(),
                lhs,
                body,
            });
        }

        let mut by_terminal: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_pair: HashMap<(SymbolId, SymbolId), Vec<usize>> = HashMap::new();
        let mut binary_rules = Vec::new();
        for (index, weighted) in rules.iter().enumerate() {
            match weighted.body {
                Body::Binary(b, c) => {
                    by_pair.entry((b, c)).or_default().push(index);
                    binary_rules.push(index);
                }
                Body::Terminal => {
                    if let Some(word) = weighted.terminal() {
                        by_terminal.entry(word.to_string()).or_default().push(index);
                    }
                }
            }
        }

        let mut model = Self {
            start,
            nonterminals: definition.nonterminals.clone(),
            nonterminal_ids,
            terminals: definition.terminals.clone(),
            rules,
            by_terminal,
            by_pair,
            binary_rules,
            nullable: Vec::new(),
        };
        model.nullable = model.compute_nullable();

        debug!(
            "Grammar ready: {} nonterminals, {} terminals, {} rules",
            model.nonterminals.len(),
            model.terminals.len(),
            model.rules.len()
        );
        Ok(model)
    }

    /// Best empty-string derivation per nonterminal, by Bellman-Ford style
    /// relaxation over binary rules whose children are both nullable.
    fn compute_nullable(&self) -> Vec<Option<NullDerivation>> {
        let mut nullable: Vec<Option<NullDerivation>> = vec![None; self.nonterminals.len()];

        for &index in self.by_terminal.get("").map(Vec::as_slice).unwrap_or_default() {
            let rule = &self.rules[index];
            let slot = &mut nullable[rule.lhs];
            if slot.is_none_or(|current| rule.log_probability > current.log_probability) {
                *slot = Some(NullDerivation {
                    log_probability: rule.log_probability,
                    rule: index,
                });
            }
        }

        for _ in 0..=self.nonterminals.len() {
            let mut changed = false;
            for &index in &self.binary_rules {
                let rule = &self.rules[index];
                let Body::Binary(b, c) = rule.body else {
                    continue;
                };
                let (Some(left), Some(right)) = (nullable[b], nullable[c]) else {
                    continue;
                };
                let log_probability =
                    rule.log_probability + left.log_probability + right.log_probability;
                let slot = &mut nullable[rule.lhs];
                if slot.is_none_or(|current| log_probability > current.log_probability) {
                    *slot = Some(NullDerivation {
                        log_probability,
                        rule: index,
                    });
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        nullable
    }

    /// Load and validate a TOML grammar file.
    pub fn from_file(path: &Path) -> Result<Self, GrammarError> {
        Self::new(&GrammarDefinition::from_file(path)?)
    }

    /// Back to the serializable form.
    #[must_use]
    pub fn definition(&self) -> GrammarDefinition {
        GrammarDefinition {
            start: self.nonterminals[self.start].clone(),
            nonterminals: self.nonterminals.clone(),
            terminals: self.terminals.clone(),
            rules: self
                .rules
                .iter()
                .map(|weighted| RuleDefinition {
                    lhs: weighted.rule.lhs.clone(),
                    rhs: match &weighted.rule.rhs {
                        Rhs::Terminal(word) => vec![word.clone()],
                        Rhs::Binary(left, right) => vec![left.clone(), right.clone()],
                    },
                    probability: weighted.probability,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn start_symbol(&self) -> &str {
        &self.nonterminals[self.start]
    }

    #[must_use]
    pub fn start_id(&self) -> SymbolId {
        self.start
    }

    #[must_use]
    pub fn nonterminals(&self) -> &[String] {
        &self.nonterminals
    }

    #[must_use]
    pub fn terminals(&self) -> &[String] {
        &self.terminals
    }

    #[must_use]
    pub fn rules(&self) -> &[WeightedRule] {
        &self.rules
    }

    /// Id of a nonterminal, if declared.
    #[must_use]
    pub fn symbol_id(&self, name: &str) -> Option<SymbolId> {
        self.nonterminal_ids.get(name).copied()
    }

    /// Name of a nonterminal id.
    #[must_use]
    pub fn symbol_name(&self, id: SymbolId) -> &str {
        &self.nonterminals[id]
    }

    /// Probability of `rule`, if the grammar has it.
    #[must_use]
    pub fn probability(&self, rule: &Rule) -> Option<f64> {
        self.rules
            .iter()
            .find(|weighted| &weighted.rule == rule)
            .map(WeightedRule::probability)
    }

    /// Rules rewriting to exactly `terminal`. Unknown words yield nothing.
    pub fn rules_for_terminal<'a>(
        &'a self,
        terminal: &str,
    ) -> impl Iterator<Item = &'a WeightedRule> + 'a {
        self.terminal_rule_ids(terminal)
            .iter()
            .map(move |&index| &self.rules[index])
    }

    /// Rules rewriting to the ordered pair `left right`. Unknown pairs yield nothing.
    pub fn rules_for_pair<'a>(
        &'a self,
        left: &str,
        right: &str,
    ) -> impl Iterator<Item = &'a WeightedRule> + 'a {
        let ids: &[usize] = match (self.symbol_id(left), self.symbol_id(right)) {
            (Some(b), Some(c)) => self.pair_rule_ids(b, c),
            _ => &[],
        };
        ids.iter().map(move |&index| &self.rules[index])
    }

    /// Best probability of deriving the empty string from `symbol`.
    #[must_use]
    pub fn nullable(&self, symbol: &str) -> Option<f64> {
        self.symbol_id(symbol)
            .and_then(|id| self.nullable[id])
            .map(|null| null.log_probability.exp())
    }

    pub(crate) fn rule_at(&self, index: usize) -> &WeightedRule {
        &self.rules[index]
    }

    pub(crate) fn terminal_rule_ids(&self, terminal: &str) -> &[usize] {
        self.by_terminal
            .get(terminal)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn pair_rule_ids(&self, left: SymbolId, right: SymbolId) -> &[usize] {
        self.by_pair
            .get(&(left, right))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub(crate) fn binary_rule_ids(&self) -> &[usize] {
        &self.binary_rules
    }

    pub(crate) fn null_derivation(&self, id: SymbolId) -> Option<NullDerivation> {
        self.nullable[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> GrammarDefinition {
        GrammarDefinition {
            start: "S".to_string(),
            nonterminals: vec!["S".into(), "A".into(), "B".into(), "E".into()],
            terminals: vec!["a".into(), "b".into(), "".into()],
            rules: vec![
                RuleDefinition::new("S", &["A", "B"], 1.0),
                RuleDefinition::new("A", &["a"], 0.5),
                RuleDefinition::new("B", &["b"], 1.0),
                RuleDefinition::new("B", &["B", "E"], 0.4),
                RuleDefinition::new("E", &[""], 1.0),
            ],
        }
    }

    #[test]
    fn test_valid_grammar_builds() {
        let grammar = GrammarModel::new(&tiny()).unwrap();
        assert_eq!(grammar.start_symbol(), "S");
        assert_eq!(grammar.rules().len(), 5);
        assert_eq!(grammar.symbol_id("B"), Some(2));
    }

    #[test]
    fn test_validate_definition() {
        assert_eq!(tiny().validate(), Ok(()));

        let mut def = tiny();
        def.rules.push(RuleDefinition::new("A", &["missing"], 0.5));
        assert!(matches!(
            def.validate(),
            Err(GrammarError::UnknownTerminal { .. })
        ));
    }

    #[test]
    fn test_unknown_start_symbol() {
        let mut def = tiny();
        def.start = "TOP".to_string();
        assert_eq!(
            GrammarModel::new(&def).unwrap_err(),
            GrammarError::UnknownStartSymbol("TOP".to_string())
        );
    }

    #[test]
    fn test_rejects_unary_nonterminal_rule() {
        let mut def = tiny();
        def.rules.push(RuleDefinition::new("S", &["A"], 0.1));
        assert!(matches!(
            GrammarModel::new(&def),
            Err(GrammarError::NotChomskyNormalForm { .. })
        ));
    }

    #[test]
    fn test_rejects_three_symbol_rule() {
        let mut def = tiny();
        def.rules.push(RuleDefinition::new("S", &["A", "B", "E"], 0.1));
        assert!(matches!(
            GrammarModel::new(&def),
            Err(GrammarError::NotChomskyNormalForm { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_rhs() {
        let mut def = tiny();
        def.rules.push(RuleDefinition::new("S", &[], 0.1));
        assert!(matches!(
            GrammarModel::new(&def),
            Err(GrammarError::NotChomskyNormalForm { .. })
        ));
    }

    #[test]
    fn test_rejects_terminal_in_binary_rule() {
        let mut def = tiny();
        def.rules.push(RuleDefinition::new("S", &["a", "B"], 0.1));
        assert!(matches!(
            GrammarModel::new(&def),
            Err(GrammarError::NotChomskyNormalForm { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_probability() {
        for probability in [0.0, -0.2, 1.5, f64::NAN] {
            let mut def = tiny();
            def.rules[1].probability = probability;
            assert!(
                matches!(
                    GrammarModel::new(&def),
                    Err(GrammarError::InvalidProbability { .. })
                ),
                "probability {probability} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_undeclared_terminal() {
        let mut def = tiny();
        def.rules.push(RuleDefinition::new("A", &["c"], 0.5));
        assert_eq!(
            GrammarModel::new(&def).unwrap_err(),
            GrammarError::UnknownTerminal {
                rule: "A -> \"c\"".to_string(),
                symbol: "c".to_string(),
            }
        );
    }

    #[test]
    fn test_rejects_undeclared_lhs() {
        let mut def = tiny();
        def.rules.push(RuleDefinition::new("X", &["a"], 0.5));
        assert!(matches!(
            GrammarModel::new(&def),
            Err(GrammarError::UnknownNonterminal { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_rule() {
        let mut def = tiny();
        def.rules.push(RuleDefinition::new("A", &["a"], 0.2));
        assert_eq!(
            GrammarModel::new(&def).unwrap_err(),
            GrammarError::DuplicateRule("A -> \"a\"".to_string())
        );
    }

    #[test]
    fn test_rejects_symbol_in_both_sets() {
        let mut def = tiny();
        def.terminals.push("A".to_string());
        assert_eq!(
            GrammarModel::new(&def).unwrap_err(),
            GrammarError::AmbiguousSymbol("A".to_string())
        );
    }

    #[test]
    fn test_lookup_by_terminal() {
        let grammar = GrammarModel::new(&tiny()).unwrap();
        let rules: Vec<_> = grammar.rules_for_terminal("a").collect();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule(), &Rule::terminal("A", "a"));
        assert!((rules[0].probability() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_lookups_are_empty() {
        let grammar = GrammarModel::new(&tiny()).unwrap();
        assert_eq!(grammar.rules_for_terminal("zebra").count(), 0);
        assert_eq!(grammar.rules_for_pair("B", "A").count(), 0);
        assert_eq!(grammar.rules_for_pair("NOPE", "A").count(), 0);
    }

    #[test]
    fn test_lookup_by_pair() {
        let grammar = GrammarModel::new(&tiny()).unwrap();
        let rules: Vec<_> = grammar.rules_for_pair("A", "B").collect();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule().lhs, "S");
    }

    #[test]
    fn test_nullable_symbols() {
        let grammar = GrammarModel::new(&tiny()).unwrap();
        assert_eq!(grammar.nullable("E"), Some(1.0));
        assert_eq!(grammar.nullable("B"), None);
        assert_eq!(grammar.nullable("S"), None);
    }

    #[test]
    fn test_nullable_through_binary_rules() {
        let mut def = tiny();
        def.rules.push(RuleDefinition::new("A", &["E", "E"], 0.25));
        let grammar = GrammarModel::new(&def).unwrap();
        let probability = grammar.nullable("A").unwrap();
        assert!((probability - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_probability_lookup() {
        let grammar = GrammarModel::new(&tiny()).unwrap();
        assert_eq!(grammar.probability(&Rule::binary("B", "B", "E")), Some(0.4));
        assert_eq!(grammar.probability(&Rule::binary("B", "E", "B")), None);
    }

    #[test]
    fn test_rule_display() {
        assert_eq!(Rule::binary("S", "Q", "R").to_string(), "S -> Q R");
        assert_eq!(Rule::terminal("E", "").to_string(), "E -> \"\"");
    }

    #[test]
    fn test_toml_roundtrip_preserves_rule_order() {
        let def = tiny();
        let toml = def.to_toml().unwrap();
        let back = GrammarDefinition::from_toml(&toml).unwrap();
        assert_eq!(back, def);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grammar.toml");
        std::fs::write(&path, tiny().to_toml().unwrap()).unwrap();

        let grammar = GrammarModel::from_file(&path).unwrap();
        assert_eq!(grammar.definition(), tiny());
    }

    #[test]
    fn test_from_missing_file() {
        let err = GrammarModel::from_file(Path::new("/nonexistent/grammar.toml")).unwrap_err();
        assert!(matches!(err, GrammarError::Definition(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = GrammarDefinition::from_toml("start = ").unwrap_err();
        assert!(matches!(err, GrammarError::Definition(_)));
    }
}
