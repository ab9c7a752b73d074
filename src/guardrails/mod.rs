// src/guardrails/mod.rs
//! Guardrails term extraction: the subset of a diet's rules that can be turned
//! into flat exclude terms for the candidate-pool sanitizer.

pub mod providers;
pub mod types;

pub use providers::{FileRulesetProvider, RulesetProvider, StaticRuleset};
pub use types::{
    GuardrailsRule, MatchMode, PlannerMode, RuleAction, RuleMatch, RuleStrictness, RuleTarget,
    Ruleset,
};

use anyhow::Result;
use std::collections::HashSet;

/// Flatten hard-block ingredient rules into exclude terms.
///
/// A rule qualifies when it is `block` + `hard` + `ingredient` and its
/// declared match mode is unset or textual. Rules with non-textual modes are
/// skipped entirely: those imply matching by canonical identifier, which this
/// extractor does not implement. Terms and synonyms are trimmed, empty ones
/// dropped, and the result deduplicated in insertion order.
pub fn extract_hard_block_terms(rules: &[GuardrailsRule]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out: Vec<String> = Vec::new();

    for rule in rules {
        if rule.action != RuleAction::Block
            || rule.strictness != RuleStrictness::Hard
            || rule.target != RuleTarget::Ingredient
        {
            continue;
        }
        if let Some(mode) = rule.match_spec.preferred_match_mode {
            if !mode.is_textual() {
                continue;
            }
        }

        for raw in std::iter::once(&rule.match_spec.term).chain(rule.match_spec.synonyms.iter()) {
            let term = raw.trim();
            if term.is_empty() {
                continue;
            }
            if seen.insert(term.to_string()) {
                out.push(term.to_string());
            }
        }
    }

    out
}

/// Load a diet's ruleset for the meal planner and extract its hard-block
/// terms. A load failure propagates: generation must fail closed rather than
/// run without guardrails.
pub async fn load_hard_block_terms_for_diet(
    provider: &dyn RulesetProvider,
    diet: &str,
    locale: &str,
) -> Result<Vec<String>> {
    let ruleset = provider.load(diet, PlannerMode::MealPlanner, locale).await?;
    let terms = extract_hard_block_terms(&ruleset.rules);
    tracing::debug!(diet, locale, count = terms.len(), "hard-block terms extracted");
    Ok(terms)
}
