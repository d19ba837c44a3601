//! Query plan construction.

use nlsearch_core::{
    ClassificationResult, Clause, DESCRIPTION_FIELD, QueryPlan, TEXT_FIELD, TITLE_FIELD,
    TYPE_FIELD,
};
use serde::{Deserialize, Serialize};

/// Default boost of the predicted-type clause.
pub const DEFAULT_TYPE_BOOST: f32 = 2.0;

/// Fields and weights used to build plans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlanConfig {
    /// Fields matched against the question fragment, in clause order
    #[serde(default = "default_lexical_fields")]
    pub lexical_fields: Vec<String>,

    /// Field matched against the predicted document type
    #[serde(default = "default_type_field")]
    pub type_field: String,

    /// Boost of the type clause relative to lexical clauses
    #[serde(default = "default_type_boost")]
    pub type_boost: f32,
}

fn default_lexical_fields() -> Vec<String> {
    vec![
        TITLE_FIELD.to_string(),
        DESCRIPTION_FIELD.to_string(),
        TEXT_FIELD.to_string(),
    ]
}

fn default_type_field() -> String {
    TYPE_FIELD.to_string()
}

fn default_type_boost() -> f32 {
    DEFAULT_TYPE_BOOST
}

impl Default for QueryPlanConfig {
    fn default() -> Self {
        Self {
            lexical_fields: default_lexical_fields(),
            type_field: default_type_field(),
            type_boost: default_type_boost(),
        }
    }
}

/// Merges the purified fragment and the predicted type into one plan.
#[derive(Debug, Clone, Default)]
pub struct QueryPlanBuilder {
    config: QueryPlanConfig,
}

impl QueryPlanBuilder {
    #[must_use]
    pub fn new(config: QueryPlanConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &QueryPlanConfig {
        &self.config
    }

    /// One clause per lexical field for a non-empty `fragment`, then one
    /// boosted type clause if there is a `classification`.
    ///
    /// Either side may be missing; with neither the plan is empty.
    #[must_use]
    pub fn build(
        &self,
        fragment: Option<&str>,
        classification: Option<&ClassificationResult>,
    ) -> QueryPlan {
        let mut plan = QueryPlan::new();

        if let Some(fragment) = fragment.filter(|f| !f.is_empty()) {
            for field in &self.config.lexical_fields {
                plan.push(Clause::term(field, fragment));
            }
        }

        if let Some(result) = classification {
            plan.push(Clause::boosted(
                &self.config.type_field,
                &result.label,
                self.config.type_boost,
            ));
        }

        plan
    }
}
