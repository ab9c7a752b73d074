// src/advisor.rs
//! # Generator Tuning Advisor
//! Pure, testable logic that maps `(plan preview, generator config)` →
//! ranked tuning suggestions. No I/O; suitable for unit tests and for the
//! admin-triggered analysis endpoint.
//!
//! Policy: at most eight suggestions, every `warn` before every `info`,
//! relative order within each severity preserved.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shopping::MealPlan;

/// Hard cap on emitted suggestions.
pub const MAX_SUGGESTIONS: usize = 8;

const MIN_PROTEIN_POOL: usize = 3;
const MIN_VEGETABLE_POOL: usize = 3;
const MIN_FAT_POOL: usize = 2;

/// A vegetable code repeated this often across veg slots triggers the
/// monotony rule.
const VEG_REPEAT_THRESHOLD: usize = 3;

// Slot convention assumed from the generator's templates:
// 0 = protein, 1-2 = veg, 3 = fat, 4+ = flavor. If the generator ever changes
// slot ordering this rule silently degrades; there is no shared contract to
// check against (see DESIGN.md).
const VEG_SLOTS: [usize; 2] = [1, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Setting,
    Pool,
    Slot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningAction {
    pub kind: ActionKind,
    pub target: String,
    pub hint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuningSuggestion {
    pub severity: Severity,
    pub code: String,
    pub title: String,
    pub actions: Vec<TuningAction>,
}

/// Per-name repeat counter as embedded by the generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatCount {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSizes {
    pub proteins: usize,
    pub vegetables: usize,
    pub fats: usize,
}

/// Telemetry the generator embeds into a preview. Taken at face value here,
/// never recomputed from the plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorMeta {
    #[serde(default)]
    pub forced_repeats_total: u32,
    #[serde(default)]
    pub forced_repeats_by_protein: Vec<RepeatCount>,
    #[serde(default)]
    pub forced_repeats_by_template: Vec<RepeatCount>,
    #[serde(default)]
    pub pool_sizes: PoolSizes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanityIssue {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A generated plan plus its embedded telemetry, as the admin screen sees it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPreview {
    pub plan: MealPlan,
    #[serde(default)]
    pub meta: GeneratorMeta,
    #[serde(default)]
    pub sanity_issues: Vec<SanityIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorConfig {
    #[serde(default)]
    pub max_repeats_per_protein: u32,
    #[serde(default)]
    pub max_template_repeats: u32,
}

/// Inspect a preview's telemetry against the generator config and emit ranked,
/// deduplicated tuning suggestions. Deterministic for a given input.
pub fn tuning_suggestions(
    preview: &PlanPreview,
    config: &GeneratorConfig,
) -> Vec<TuningSuggestion> {
    let mut out: Vec<TuningSuggestion> = Vec::new();

    // 1) Forced repeats: the generator had to reuse items to fill slots.
    if let Some(s) = forced_repeats_rule(&preview.meta, config) {
        out.push(s);
    }

    // 2) Undersized pools.
    if let Some(s) = pool_size_rule(&preview.meta.pool_sizes) {
        out.push(s);
    }

    // 3) Sanity-check issues, grouped by code. Unknown codes are dropped
    //    without a suggestion or a log entry.
    out.extend(sanity_rule(&preview.sanity_issues));

    // 4) Vegetable monotony over the veg slots; first offending code only.
    if let Some(s) = veg_monotony_rule(&preview.plan) {
        out.push(s);
    }

    // 5) Rank and cap: stable sort keeps relative order within a severity.
    out.sort_by_key(|s| s.severity);
    out.truncate(MAX_SUGGESTIONS);

    // Dev-only contract checks; the enum types already rule out bad action
    // kinds, so assert the shape invariants instead.
    debug_assert!(out.len() <= MAX_SUGGESTIONS);
    debug_assert!(
        out.windows(2).all(|w| w[0].severity <= w[1].severity),
        "warn suggestions must precede info suggestions"
    );

    out
}

fn forced_repeats_rule(
    meta: &GeneratorMeta,
    config: &GeneratorConfig,
) -> Option<TuningSuggestion> {
    let any_repeats = meta.forced_repeats_total > 0
        || meta.forced_repeats_by_protein.iter().any(|r| r.count > 0)
        || meta.forced_repeats_by_template.iter().any(|r| r.count > 0);
    if !any_repeats {
        return None;
    }

    let mut actions = vec![TuningAction {
        kind: ActionKind::Setting,
        target: "max_repeats_per_protein".to_string(),
        hint: format!(
            "Raise the repeat cap (currently {}) or expand the pools so slots can be filled without reuse",
            config.max_repeats_per_protein
        ),
    }];

    let top_proteins = top_counts(&meta.forced_repeats_by_protein, 3);
    if !top_proteins.is_empty() {
        actions.push(TuningAction {
            kind: ActionKind::Pool,
            target: "proteins".to_string(),
            hint: format!("Most repeated proteins: {}", top_proteins),
        });
    }

    let top_templates = top_counts(&meta.forced_repeats_by_template, 2);
    if !top_templates.is_empty() && actions.len() < 3 {
        actions.push(TuningAction {
            kind: ActionKind::Slot,
            target: "templates".to_string(),
            hint: format!("Most repeated templates: {}", top_templates),
        });
    }

    Some(TuningSuggestion {
        severity: Severity::Warn,
        code: "FORCED_REPEATS".to_string(),
        title: format!(
            "Generator forced {} repeats to fill the plan",
            meta.forced_repeats_total
        ),
        actions,
    })
}

/// Top-N names by count, descending, formatted "name (xN)". Stable for ties.
fn top_counts(counts: &[RepeatCount], n: usize) -> String {
    let mut sorted: Vec<&RepeatCount> = counts.iter().filter(|r| r.count > 0).collect();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted
        .iter()
        .take(n)
        .map(|r| format!("{} (x{})", r.name, r.count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn pool_size_rule(sizes: &PoolSizes) -> Option<TuningSuggestion> {
    let mut undersized: Vec<(&str, usize, usize)> = Vec::new();
    if sizes.proteins < MIN_PROTEIN_POOL {
        undersized.push(("proteins", sizes.proteins, MIN_PROTEIN_POOL));
    }
    if sizes.vegetables < MIN_VEGETABLE_POOL {
        undersized.push(("vegetables", sizes.vegetables, MIN_VEGETABLE_POOL));
    }
    if sizes.fats < MIN_FAT_POOL {
        undersized.push(("fats", sizes.fats, MIN_FAT_POOL));
    }
    if undersized.is_empty() {
        return None;
    }

    let actions = undersized
        .iter()
        .map(|(pool, have, want)| TuningAction {
            kind: ActionKind::Pool,
            target: (*pool).to_string(),
            hint: format!("Pool has {} items (minimum {}); add 5-10 items", have, want),
        })
        .collect();

    Some(TuningSuggestion {
        severity: Severity::Warn,
        code: "POOL_TOO_SMALL".to_string(),
        title: format!(
            "Undersized candidate pools: {}",
            undersized
                .iter()
                .map(|(p, _, _)| *p)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        actions,
    })
}

fn sanity_rule(issues: &[SanityIssue]) -> Vec<TuningSuggestion> {
    let mut by_code: HashMap<&str, usize> = HashMap::new();
    for issue in issues {
        *by_code.entry(issue.code.as_str()).or_insert(0) += 1;
    }

    // Fixed order so output is deterministic regardless of issue order.
    let mut out = Vec::new();
    if let Some(&n) = by_code.get("INGREDIENT_COUNT_OUT_OF_RANGE") {
        out.push(TuningSuggestion {
            severity: Severity::Warn,
            code: "INGREDIENT_COUNT_OUT_OF_RANGE".to_string(),
            title: format!("{} meal(s) with an ingredient count outside the template range", n),
            actions: vec![
                TuningAction {
                    kind: ActionKind::Slot,
                    target: "meals".to_string(),
                    hint: "Check template slot definitions for the affected meals".to_string(),
                },
                TuningAction {
                    kind: ActionKind::Setting,
                    target: "ingredients_per_meal".to_string(),
                    hint: "Align the min/max ingredient settings with the templates".to_string(),
                },
            ],
        });
    }
    if let Some(&n) = by_code.get("PLACEHOLDER_NAME") {
        out.push(TuningSuggestion {
            severity: Severity::Warn,
            code: "PLACEHOLDER_NAME".to_string(),
            title: format!("{} ingredient(s) with placeholder names reached the plan", n),
            actions: vec![TuningAction {
                kind: ActionKind::Pool,
                target: "all".to_string(),
                hint: "Refresh the nutrition import; placeholder names mean missing records"
                    .to_string(),
            }],
        });
    }
    if let Some(&n) = by_code.get("EMPTY_DAY") {
        out.push(TuningSuggestion {
            severity: Severity::Warn,
            code: "EMPTY_DAY".to_string(),
            title: format!("{} day(s) came back without meals", n),
            actions: vec![
                TuningAction {
                    kind: ActionKind::Setting,
                    target: "min_meals_per_day".to_string(),
                    hint: "Lower the per-day minimum or add templates for the empty slots"
                        .to_string(),
                },
                TuningAction {
                    kind: ActionKind::Pool,
                    target: "all".to_string(),
                    hint: "Empty days usually follow an over-filtered pool".to_string(),
                },
            ],
        });
    }
    out
}

fn veg_monotony_rule(plan: &MealPlan) -> Option<TuningSuggestion> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for day in &plan.days {
        for meal in &day.meals {
            for slot in VEG_SLOTS {
                let Some(code) = meal
                    .ingredients
                    .get(slot)
                    .and_then(|r| r.nevo_code.as_deref())
                else {
                    continue;
                };
                let count = counts.entry(code).or_insert(0);
                *count += 1;
                if *count >= VEG_REPEAT_THRESHOLD {
                    // First offender wins; later repeats never add a second
                    // suggestion.
                    return Some(TuningSuggestion {
                        severity: Severity::Info,
                        code: "VEG_MONOTONY".to_string(),
                        title: format!(
                            "Vegetable NEVO {} appears {} or more times",
                            code, VEG_REPEAT_THRESHOLD
                        ),
                        actions: vec![TuningAction {
                            kind: ActionKind::Pool,
                            target: "vegetables".to_string(),
                            hint: "Add vegetable variety so repeated slots can rotate".to_string(),
                        }],
                    });
                }
            }
        }
    }
    None
}
