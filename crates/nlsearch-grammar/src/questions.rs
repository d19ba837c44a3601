//! Built-in grammar for short English questions.
//!
//! Questions are `S -> Q R`: an interrogative word followed by a verb phrase
//! and the object being asked about.
//!
//! The `"how much"` terminal contains a space, so it never matches a token
//! produced by [`tokenize`](crate::tokenize). It is only reachable by callers
//! that hand [`CkyParser::parse`](crate::CkyParser::parse) their own tokens.

use nlsearch_core::GrammarError;

use crate::grammar::{GrammarDefinition, GrammarModel, RuleDefinition};

const NONTERMINALS: &[&str] = &[
    "S", "NP", "VP", "DT", "Vi", "Vt", "NN", "IN", "NNP", "Adv", "E", "Q", "R", "VVP", "PVP",
    "AVP", "D", "PN",
];

const TERMINALS: &[&str] = &[
    "work", "see", "are", "is", "I", "you", "he", "she", "we", "they", "it", "how", "how much",
    "which", "what", "who", "Lucene", "Oak", "admin", "there", "repository", "", "do", "does",
    "the", "with", "in", "for", "of", "badly", "nicely",
];

/// `(lhs, rhs, probability)` in tie-break order.
const RULES: &[(&str, &[&str], f64)] = &[
    ("S", &["Q", "R"], 1.0),
    ("E", &[""], 1.0),
    ("Q", &["how"], 0.2),
    ("Q", &["how much"], 0.1),
    ("Q", &["which"], 0.3),
    ("Q", &["what"], 0.2),
    ("Q", &["who"], 0.2),
    ("R", &["VVP", "NP"], 1.0),
    ("R", &["VVP", "Adv"], 1.0),
    ("R", &["VVP", "E"], 0.5),
    ("VVP", &["PVP", "AVP"], 0.4),
    ("VVP", &["PVP", "VP"], 0.3),
    ("VVP", &["VP", "E"], 0.3),
    ("PVP", &["D", "PN"], 0.4),
    ("D", &["do"], 0.7),
    ("D", &["does"], 0.3),
    ("PN", &["I"], 0.1),
    ("PN", &["you"], 0.4),
    ("PN", &["he"], 0.1),
    ("PN", &["she"], 0.1),
    ("PN", &["it"], 0.1),
    ("PN", &["we"], 0.1),
    ("PN", &["they"], 0.1),
    ("AVP", &["Adv", "Vi"], 0.3),
    ("AVP", &["Adv", "Vt"], 0.2),
    ("VP", &["Vi", "E"], 0.2),
    ("VP", &["Vt", "E"], 0.3),
    ("Vi", &["work"], 1.0),
    ("Vi", &["is"], 1.0),
    ("Vi", &["are"], 1.0),
    ("Vt", &["see"], 1.0),
    ("NP", &["DT", "NN"], 0.5),
    ("NP", &["NNP", "E"], 0.5),
    ("NNP", &["Lucene"], 0.3),
    ("NNP", &["Oak"], 0.3),
    ("NN", &["repository"], 0.3),
    ("DT", &["the"], 1.0),
    ("IN", &["with"], 0.2),
    ("IN", &["in"], 0.1),
    ("IN", &["for"], 0.4),
    ("IN", &["of"], 0.4),
    ("NN", &["admin"], 0.1),
    ("Adv", &["badly"], 0.3),
    ("Adv", &["nicely"], 0.6),
    ("Adv", &["there"], 0.1),
];

/// Definition of the built-in question grammar.
#[must_use]
pub fn question_grammar_definition() -> GrammarDefinition {
    GrammarDefinition {
        start: "S".to_string(),
        nonterminals: NONTERMINALS.iter().map(ToString::to_string).collect(),
        terminals: TERMINALS.iter().map(ToString::to_string).collect(),
        rules: RULES
            .iter()
            .map(|(lhs, rhs, probability)| RuleDefinition::new(lhs, rhs, *probability))
            .collect(),
    }
}

/// The built-in question grammar, validated.
pub fn question_grammar() -> Result<GrammarModel, GrammarError> {
    GrammarModel::new(&question_grammar_definition())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;

    #[test]
    fn test_multi_word_terminal_needs_caller_tokens() {
        use crate::{CkyParser, tokenize};
        use std::sync::Arc;

        let parser = CkyParser::new(Arc::new(question_grammar().unwrap()));
        assert!(parser.parse(&["how much", "is", "the", "repository"]).is_some());

        let tokens = tokenize("how much is the repository");
        assert_eq!(tokens[..2], ["how", "much"]);
        assert!(parser.parse(&tokens).is_none());
    }

    #[test]
    fn test_question_grammar_is_valid() {
        let grammar = question_grammar().unwrap();
        assert_eq!(grammar.start_symbol(), "S");
        assert_eq!(grammar.nonterminals().len(), 18);
        assert_eq!(grammar.rules().len(), RULES.len());
    }

    #[test]
    fn test_every_rule_terminal_is_declared() {
        let def = question_grammar_definition();
        for rule in &def.rules {
            if let [word] = rule.rhs.as_slice() {
                assert!(def.terminals.contains(word), "{word:?} undeclared");
            }
        }
    }

    #[test]
    fn test_only_empty_constituent_is_nullable() {
        let grammar = question_grammar().unwrap();
        assert_eq!(grammar.nullable("E"), Some(1.0));
        for symbol in NONTERMINALS.iter().filter(|s| **s != "E") {
            assert_eq!(grammar.nullable(symbol), None, "{symbol} should not derive \"\"");
        }
    }

    #[test]
    fn test_interrogatives() {
        let grammar = question_grammar().unwrap();
        let lhs: Vec<_> = grammar
            .rules_for_terminal("how much")
            .map(|r| r.rule().lhs.as_str())
            .collect();
        assert_eq!(lhs, vec!["Q"]);
        assert_eq!(grammar.probability(&Rule::terminal("Q", "which")), Some(0.3));
    }

    #[test]
    fn test_sentence_may_end_after_verb_phrase() {
        let grammar = question_grammar().unwrap();
        assert_eq!(grammar.probability(&Rule::binary("R", "VVP", "E")), Some(0.5));
    }
}
