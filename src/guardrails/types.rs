// src/guardrails/types.rs
//! Wire types for diet guardrails rulesets. These mirror the JSON the rule
//! editor produces; unknown enum values deserialize into `Other` so new rule
//! kinds never break loading.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Block,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStrictness {
    Hard,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleTarget {
    Ingredient,
    #[serde(other)]
    Other,
}

/// Declared matching semantics for a rule's term. Modes beyond the three
/// textual ones (e.g. canonical-id matching) are represented as `Other` and
/// skipped by the term extractor, which only implements free-text matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    Exact,
    WordBoundary,
    Substring,
    #[serde(other)]
    Other,
}

impl MatchMode {
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Exact | Self::WordBoundary | Self::Substring)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMatch {
    pub term: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_match_mode: Option<MatchMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardrailsRule {
    pub action: RuleAction,
    pub strictness: RuleStrictness,
    pub target: RuleTarget,
    #[serde(rename = "match")]
    pub match_spec: RuleMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub rules: Vec<GuardrailsRule>,
}

/// Which planner surface a ruleset is loaded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerMode {
    MealPlanner,
}

impl PlannerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MealPlanner => "meal_planner",
        }
    }
}
