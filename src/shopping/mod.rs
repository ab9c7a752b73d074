// src/shopping/mod.rs
//! Shopping-list and pantry-coverage aggregation over a finalized meal plan.
//!
//! All computation is request-scoped; the only cross-request state is the
//! injected nutrition cache. Individual lookup failures degrade to placeholder
//! names so one bad reference cannot blank the whole list.

pub mod lookup;
pub mod providers;
pub mod types;

pub use lookup::{
    CanonicalIdResolver, NutritionCache, NutritionLookup, NutritionRecord, PantryProvider,
    TtlNutritionCache, DEFAULT_NUTRITION_CACHE_TTL,
};
pub use providers::{HttpNutritionApi, NoPantry, StaticNutritionTable};
pub use types::{
    CoverageItem, IngredientReference, Meal, MealCoverage, MealPlan, MealPlanCoverage,
    PantryAvailability, PlanDay, ShoppingListGroup, ShoppingListItem, ShoppingListResponse,
    UNLIMITED_AVAILABLE_G,
};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub struct ShoppingAggregator {
    lookup: Arc<dyn NutritionLookup>,
    resolver: Arc<dyn CanonicalIdResolver>,
    pantry: Arc<dyn PantryProvider>,
    cache: Arc<dyn NutritionCache>,
}

impl ShoppingAggregator {
    pub fn new(
        lookup: Arc<dyn NutritionLookup>,
        resolver: Arc<dyn CanonicalIdResolver>,
        pantry: Arc<dyn PantryProvider>,
        cache: Arc<dyn NutritionCache>,
    ) -> Self {
        Self {
            lookup,
            resolver,
            pantry,
            cache,
        }
    }

    /// Cached record fetch. Unknown codes, unparsable codes and transport
    /// errors all come back as `None`; transport errors additionally warn.
    async fn record_for(&self, code: &str) -> Option<NutritionRecord> {
        let numeric: u32 = code.trim().parse().ok()?;
        if let Some(hit) = self.cache.get(numeric) {
            return Some(hit);
        }
        match self.lookup.get_by_code(numeric).await {
            Ok(Some(record)) => {
                let record = record.with_canonical_unit();
                self.cache.put(record.clone());
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = ?e, code, "nutrition lookup failed, using placeholder");
                None
            }
        }
    }

    async fn display_name(&self, code: &str) -> String {
        match self.record_for(code).await {
            Some(record) => record.name,
            None => placeholder_name(code),
        }
    }

    /// Per-meal and aggregate required/available/missing grams for every
    /// ingredient reference that carries a nevo code.
    pub async fn build_coverage(
        &self,
        plan: &MealPlan,
        pantry: Option<&[PantryAvailability]>,
    ) -> MealPlanCoverage {
        let availability = pantry_map(pantry);

        let mut meals = Vec::new();
        let mut total_required = 0.0f64;
        let mut total_missing = 0.0f64;

        for (day_idx, day) in plan.days.iter().enumerate() {
            let day_label = day
                .label
                .clone()
                .unwrap_or_else(|| format!("day {}", day_idx + 1));
            for (meal_idx, meal) in day.meals.iter().enumerate() {
                let label = meal
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{} meal {}", day_label, meal_idx + 1));

                let mut items = Vec::new();
                let mut meal_required = 0.0f64;
                let mut meal_missing = 0.0f64;

                for reference in &meal.ingredients {
                    let Some(code) = reference.nevo_code.as_deref() else {
                        continue;
                    };
                    let required = reference.quantity_g.max(0.0);
                    let available = availability.get(code).copied().unwrap_or(0.0);
                    let missing = (required - available).max(0.0);

                    meal_required += required;
                    meal_missing += missing;

                    items.push(CoverageItem {
                        nevo_code: code.to_string(),
                        name: self.display_name(code).await,
                        required_g: required,
                        available_g: available,
                        missing_g: missing,
                    });
                }

                total_required += meal_required;
                total_missing += meal_missing;
                meals.push(MealCoverage {
                    meal: label,
                    required_g: meal_required,
                    missing_g: meal_missing,
                    items,
                });
            }
        }

        let coverage_pct = if total_required <= 0.0 {
            100.0
        } else {
            round1(((total_required - total_missing) / total_required) * 100.0)
        };

        MealPlanCoverage {
            meals,
            total_required_g: total_required,
            total_missing_g: total_missing,
            coverage_pct,
        }
    }

    /// Pantry-aware variant: derives the nevo-code set from the plan and pulls
    /// the snapshot through the pantry provider first.
    pub async fn build_coverage_for_user(
        &self,
        plan: &MealPlan,
        user_id: &str,
    ) -> MealPlanCoverage {
        let codes = plan_nevo_codes(plan);
        let snapshot = self.pantry.load_availability_by_codes(user_id, &codes).await;
        self.build_coverage(plan, Some(&snapshot)).await
    }

    /// Categorized shopping list for the whole plan. Grams aggregate per
    /// ingredient identity: canonical id when present, else nevo code; entries
    /// with neither are skipped.
    pub async fn build_shopping_list(
        &self,
        plan: &MealPlan,
        pantry: Option<&[PantryAvailability]>,
    ) -> ShoppingListResponse {
        let availability = pantry_map(pantry);

        // 1) Aggregate required grams per identity across the whole plan.
        struct Pending {
            canonical_id: Option<String>,
            nevo_code: Option<String>,
            required_g: f64,
        }
        let mut aggregated: HashMap<String, Pending> = HashMap::new();
        for day in &plan.days {
            for meal in &day.meals {
                for reference in &meal.ingredients {
                    let identity = match (
                        reference.canonical_ingredient_id.as_deref(),
                        reference.nevo_code.as_deref(),
                    ) {
                        (Some(id), _) => id.to_string(),
                        (None, Some(code)) => code.to_string(),
                        (None, None) => continue,
                    };
                    let entry = aggregated.entry(identity).or_insert_with(|| Pending {
                        canonical_id: reference.canonical_ingredient_id.clone(),
                        nevo_code: reference.nevo_code.clone(),
                        required_g: 0.0,
                    });
                    entry.required_g += reference.quantity_g.max(0.0);
                }
            }
        }

        // 2) One batch call for every entry still missing a canonical id.
        let to_resolve: Vec<String> = aggregated
            .values()
            .filter(|p| p.canonical_id.is_none())
            .filter_map(|p| p.nevo_code.clone())
            .collect();
        let resolved = if to_resolve.is_empty() {
            HashMap::new()
        } else {
            match self.resolver.resolve_ids_by_codes(&to_resolve).await {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(error = ?e, "canonical id resolution failed for the whole batch");
                    HashMap::new()
                }
            }
        };
        let mut unresolved: Vec<String> = to_resolve
            .iter()
            .filter(|code| !resolved.contains_key(*code))
            .cloned()
            .collect();
        unresolved.sort();
        unresolved.dedup();

        // 3) Materialize items with display names and categories.
        let mut items = Vec::with_capacity(aggregated.len());
        for pending in aggregated.into_values() {
            let canonical_id = pending.canonical_id.clone().or_else(|| {
                pending
                    .nevo_code
                    .as_ref()
                    .and_then(|code| resolved.get(code).cloned())
            });

            let (name, food_group) = match pending.nevo_code.as_deref() {
                Some(code) => match self.record_for(code).await {
                    Some(record) => (record.name, record.food_group),
                    None => (placeholder_name(code), None),
                },
                // Canonical-only references have no lookup path here; the id
                // doubles as the display name.
                None => (pending.canonical_id.clone().unwrap_or_default(), None),
            };

            let available = pending
                .nevo_code
                .as_deref()
                .and_then(|code| availability.get(code).copied())
                .unwrap_or(0.0);
            let missing = (pending.required_g - available).max(0.0);

            items.push(ShoppingListItem {
                canonical_ingredient_id: canonical_id,
                nevo_code: pending.nevo_code,
                name,
                category: category_for_food_group(food_group.as_deref()),
                required_g: pending.required_g,
                available_g: available,
                missing_g: missing,
            });
        }

        // 4) Partition by category; groups sorted by name, items by name.
        let total_items = items.len();
        let mut by_category: BTreeMap<String, Vec<ShoppingListItem>> = BTreeMap::new();
        for item in items {
            by_category.entry(item.category.clone()).or_default().push(item);
        }
        let groups = by_category
            .into_iter()
            .map(|(category, mut items)| {
                items.sort_by(|a, b| a.name.cmp(&b.name));
                ShoppingListGroup { category, items }
            })
            .collect();

        ShoppingListResponse {
            groups,
            unresolved_nevo_codes: unresolved,
            total_items,
            generated_at: chrono::Utc::now(),
        }
    }

    pub async fn build_shopping_list_for_user(
        &self,
        plan: &MealPlan,
        user_id: &str,
    ) -> ShoppingListResponse {
        let codes = plan_nevo_codes(plan);
        let snapshot = self.pantry.load_availability_by_codes(user_id, &codes).await;
        self.build_shopping_list(plan, Some(&snapshot)).await
    }
}

fn placeholder_name(code: &str) -> String {
    format!("NEVO {}", code)
}

/// All distinct nevo codes referenced by a plan, sorted for determinism.
pub fn plan_nevo_codes(plan: &MealPlan) -> Vec<String> {
    let mut codes: Vec<String> = plan
        .days
        .iter()
        .flat_map(|d| d.meals.iter())
        .flat_map(|m| m.ingredients.iter())
        .filter_map(|r| r.nevo_code.clone())
        .collect();
    codes.sort();
    codes.dedup();
    codes
}

fn pantry_map(pantry: Option<&[PantryAvailability]>) -> HashMap<String, f64> {
    pantry
        .unwrap_or_default()
        .iter()
        .map(|p| (p.nevo_code.clone(), p.grams()))
        .collect()
}

/// Round to one decimal place.
fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// Map free-text food-group labels (EN/NL) onto the five shopping buckets,
/// falling through to the raw label, then "Other".
fn category_for_food_group(group: Option<&str>) -> String {
    let Some(raw) = group else {
        return "Other".to_string();
    };
    let g = raw.to_lowercase();

    const PROTEIN: &[&str] = &[
        "vlees", "meat", "vis", "fish", "ei", "egg", "gevogelte", "poultry", "kip", "chicken",
        "peulvrucht", "legume",
    ];
    const VEGETABLE: &[&str] = &["groente", "vegetable"];
    const FRUIT: &[&str] = &["fruit", "vruchten"];
    const FAT: &[&str] = &["vet", "fat", "olie", "oil", "noten", "nut", "boter", "butter"];
    const CARB: &[&str] = &[
        "brood", "bread", "graan", "grain", "cereal", "pasta", "rijst", "rice", "aardappel",
        "potato",
    ];

    let hit = |keys: &[&str]| keys.iter().any(|k| g.contains(k));
    if hit(PROTEIN) {
        "Proteins".to_string()
    } else if hit(VEGETABLE) {
        "Vegetables".to_string()
    } else if hit(FRUIT) {
        "Fruits".to_string()
    } else if hit(FAT) {
        "Fats".to_string()
    } else if hit(CARB) {
        "Carbohydrates".to_string()
    } else if raw.trim().is_empty() {
        "Other".to_string()
    } else {
        raw.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn food_group_buckets() {
        assert_eq!(category_for_food_group(Some("Groenten")), "Vegetables");
        assert_eq!(category_for_food_group(Some("Vlees en gevogelte")), "Proteins");
        assert_eq!(category_for_food_group(Some("Oliën en vetten")), "Fats");
        assert_eq!(category_for_food_group(Some("Brood en graanproducten")), "Carbohydrates");
        assert_eq!(category_for_food_group(Some("Kruiden")), "Kruiden");
        assert_eq!(category_for_food_group(Some("  ")), "Other");
        assert_eq!(category_for_food_group(None), "Other");
    }

    #[test]
    fn round1_behaves() {
        assert_eq!(round1(74.96), 75.0);
        assert_eq!(round1(33.333), 33.3);
    }

    #[test]
    fn plan_codes_sorted_and_deduped() {
        let plan = MealPlan {
            days: vec![PlanDay {
                label: None,
                meals: vec![Meal {
                    name: None,
                    ingredients: vec![
                        IngredientReference {
                            nevo_code: Some("205".into()),
                            quantity_g: 100.0,
                            ..Default::default()
                        },
                        IngredientReference {
                            nevo_code: Some("101".into()),
                            quantity_g: 50.0,
                            ..Default::default()
                        },
                        IngredientReference {
                            nevo_code: Some("205".into()),
                            quantity_g: 25.0,
                            ..Default::default()
                        },
                    ],
                }],
            }],
        };
        assert_eq!(plan_nevo_codes(&plan), vec!["101", "205"]);
    }
}
