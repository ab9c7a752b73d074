// src/shopping/types.rs
//! Wire types for meal plans, pantry snapshots and the shopping/coverage
//! aggregates. The response shapes here are stable JSON contracts consumed by
//! the coaching UI; field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

/// Sentinel for "pantry says available, no quantity given". Matches the
/// JS `Number.MAX_SAFE_INTEGER` the upstream data uses.
pub const UNLIMITED_AVAILABLE_G: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub days: Vec<PlanDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub meals: Vec<Meal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub ingredients: Vec<IngredientReference>,
}

/// Reference to an ingredient inside a meal. For aggregation an entry needs at
/// least one of `canonical_ingredient_id` / `nevo_code`; entries with neither
/// are silently skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nevo_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_ingredient_id: Option<String>,
    pub quantity_g: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Pantry availability for one nevo code. `available_g` wins when present;
/// `is_available == true` without a quantity means "effectively unlimited".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryAvailability {
    pub nevo_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_g: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
}

impl PantryAvailability {
    /// Grams this entry makes available.
    pub fn grams(&self) -> f64 {
        match (self.available_g, self.is_available) {
            (Some(g), _) => g.max(0.0),
            (None, Some(true)) => UNLIMITED_AVAILABLE_G,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageItem {
    pub nevo_code: String,
    pub name: String,
    pub required_g: f64,
    pub available_g: f64,
    pub missing_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealCoverage {
    pub meal: String,
    pub required_g: f64,
    pub missing_g: f64,
    pub items: Vec<CoverageItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanCoverage {
    pub meals: Vec<MealCoverage>,
    pub total_required_g: f64,
    pub total_missing_g: f64,
    /// Percentage of required grams covered by the pantry, one decimal.
    /// Defined as 100 for an empty plan.
    pub coverage_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_ingredient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nevo_code: Option<String>,
    pub name: String,
    pub category: String,
    pub required_g: f64,
    pub available_g: f64,
    pub missing_g: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListGroup {
    pub category: String,
    pub items: Vec<ShoppingListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListResponse {
    pub groups: Vec<ShoppingListGroup>,
    /// Nevo codes that could not be resolved to a canonical ingredient id,
    /// sorted and deduplicated. Surfaced on purpose: it flags a data-quality
    /// gap upstream rather than hiding it.
    pub unresolved_nevo_codes: Vec<String>,
    pub total_items: usize,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}
