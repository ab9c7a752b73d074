// tests/shopping_coverage.rs
// Pantry-coverage aggregation over a finalized meal plan, driven through
// fake collaborators so every lookup outcome is deterministic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mealplan_guardrails::shopping::{
    CanonicalIdResolver, IngredientReference, Meal, MealPlan, NutritionLookup, NutritionRecord,
    PantryAvailability, PantryProvider, PlanDay, ShoppingAggregator, TtlNutritionCache,
    UNLIMITED_AVAILABLE_G,
};

struct FakeLookup {
    records: HashMap<u32, NutritionRecord>,
    calls: AtomicUsize,
    fail: bool,
}

impl FakeLookup {
    fn new(records: Vec<NutritionRecord>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.code, r)).collect(),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            records: HashMap::new(),
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl NutritionLookup for FakeLookup {
    async fn get_by_code(&self, code: u32) -> Result<Option<NutritionRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("nutrition backend unavailable");
        }
        Ok(self.records.get(&code).cloned())
    }
}

struct NoResolver;

#[async_trait::async_trait]
impl CanonicalIdResolver for NoResolver {
    async fn resolve_ids_by_codes(&self, _codes: &[String]) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}

struct FakePantry {
    snapshot: Vec<PantryAvailability>,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl PantryProvider for FakePantry {
    async fn load_availability_by_codes(
        &self,
        _user_id: &str,
        _codes: &[String],
    ) -> Vec<PantryAvailability> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot.clone()
    }
}

fn rec(code: u32, name: &str) -> NutritionRecord {
    NutritionRecord {
        code,
        name: name.to_string(),
        food_group: None,
        unit: None,
    }
}

fn ingredient(code: &str, grams: f64) -> IngredientReference {
    IngredientReference {
        nevo_code: Some(code.to_string()),
        quantity_g: grams,
        ..Default::default()
    }
}

fn one_meal_plan(name: &str, ingredients: Vec<IngredientReference>) -> MealPlan {
    MealPlan {
        days: vec![PlanDay {
            label: None,
            meals: vec![Meal {
                name: Some(name.to_string()),
                ingredients,
            }],
        }],
    }
}

fn aggregator(lookup: Arc<FakeLookup>, pantry: Arc<FakePantry>) -> ShoppingAggregator {
    ShoppingAggregator::new(
        lookup,
        Arc::new(NoResolver),
        pantry,
        Arc::new(TtlNutritionCache::new(Duration::from_secs(60))),
    )
}

fn empty_pantry() -> Arc<FakePantry> {
    Arc::new(FakePantry {
        snapshot: Vec::new(),
        calls: AtomicUsize::new(0),
    })
}

#[tokio::test]
async fn coverage_pct_rounds_to_one_decimal() {
    let lookup = Arc::new(FakeLookup::new(vec![rec(101, "Kipfilet")]));
    let agg = aggregator(lookup, empty_pantry());

    // 400 g required, 100 g on hand: 75.0% covered.
    let plan = one_meal_plan("lunch", vec![ingredient("101", 400.0)]);
    let pantry = vec![PantryAvailability {
        nevo_code: "101".into(),
        available_g: Some(100.0),
        is_available: None,
    }];

    let out = agg.build_coverage(&plan, Some(&pantry)).await;
    assert_eq!(out.total_required_g, 400.0);
    assert_eq!(out.total_missing_g, 300.0);
    assert_eq!(out.coverage_pct, 75.0);

    let meal = &out.meals[0];
    assert_eq!(meal.meal, "lunch");
    assert_eq!(meal.items[0].name, "Kipfilet");
    assert_eq!(meal.items[0].missing_g, 300.0);
}

#[tokio::test]
async fn unlimited_pantry_entry_zeroes_missing() {
    let lookup = Arc::new(FakeLookup::new(vec![rec(205, "Broccoli")]));
    let agg = aggregator(lookup, empty_pantry());

    let plan = one_meal_plan("dinner", vec![ingredient("205", 250.0)]);
    let pantry = vec![PantryAvailability {
        nevo_code: "205".into(),
        available_g: None,
        is_available: Some(true),
    }];

    let out = agg.build_coverage(&plan, Some(&pantry)).await;
    assert_eq!(out.meals[0].items[0].available_g, UNLIMITED_AVAILABLE_G);
    assert_eq!(out.total_missing_g, 0.0);
    assert_eq!(out.coverage_pct, 100.0);
}

#[tokio::test]
async fn empty_plan_is_fully_covered() {
    let lookup = Arc::new(FakeLookup::new(vec![]));
    let agg = aggregator(lookup, empty_pantry());

    let out = agg.build_coverage(&MealPlan::default(), None).await;
    assert!(out.meals.is_empty());
    assert_eq!(out.coverage_pct, 100.0);
}

#[tokio::test]
async fn lookup_failures_degrade_to_placeholder_names() {
    let lookup = Arc::new(FakeLookup::failing());
    let agg = aggregator(lookup, empty_pantry());

    let plan = one_meal_plan("breakfast", vec![ingredient("333", 100.0)]);
    let out = agg.build_coverage(&plan, None).await;

    // The gram math still runs; only the display name is lost.
    assert_eq!(out.meals[0].items[0].name, "NEVO 333");
    assert_eq!(out.total_required_g, 100.0);
    assert_eq!(out.total_missing_g, 100.0);
    assert_eq!(out.coverage_pct, 0.0);
}

#[tokio::test]
async fn references_without_a_code_are_skipped() {
    let lookup = Arc::new(FakeLookup::new(vec![rec(101, "Kipfilet")]));
    let agg = aggregator(lookup, empty_pantry());

    let plan = one_meal_plan(
        "lunch",
        vec![
            ingredient("101", 150.0),
            IngredientReference {
                nevo_code: None,
                canonical_ingredient_id: Some("ing_salt".into()),
                quantity_g: 5.0,
                tags: vec![],
            },
        ],
    );
    let out = agg.build_coverage(&plan, None).await;
    assert_eq!(out.meals[0].items.len(), 1);
    assert_eq!(out.total_required_g, 150.0);
}

#[tokio::test]
async fn user_variant_pulls_the_pantry_snapshot() {
    let lookup = Arc::new(FakeLookup::new(vec![rec(101, "Kipfilet")]));
    let pantry = Arc::new(FakePantry {
        snapshot: vec![PantryAvailability {
            nevo_code: "101".into(),
            available_g: Some(50.0),
            is_available: None,
        }],
        calls: AtomicUsize::new(0),
    });
    let agg = aggregator(lookup, pantry.clone());

    let plan = one_meal_plan("lunch", vec![ingredient("101", 200.0)]);
    let out = agg.build_coverage_for_user(&plan, "user-7").await;

    assert_eq!(pantry.calls.load(Ordering::SeqCst), 1);
    assert_eq!(out.total_missing_g, 150.0);
    assert_eq!(out.coverage_pct, 25.0);
}

#[tokio::test]
async fn repeated_codes_hit_the_cache_not_the_backend() {
    let lookup = Arc::new(FakeLookup::new(vec![rec(101, "Kipfilet")]));
    let agg = aggregator(lookup.clone(), empty_pantry());

    let plan = MealPlan {
        days: vec![PlanDay {
            label: Some("ma".into()),
            meals: vec![
                Meal {
                    name: None,
                    ingredients: vec![ingredient("101", 100.0)],
                },
                Meal {
                    name: None,
                    ingredients: vec![ingredient("101", 100.0)],
                },
            ],
        }],
    };
    let out = agg.build_coverage(&plan, None).await;
    assert_eq!(out.meals.len(), 2);
    assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unnamed_meals_get_positional_labels() {
    let lookup = Arc::new(FakeLookup::new(vec![]));
    let agg = aggregator(lookup, empty_pantry());

    let plan = MealPlan {
        days: vec![PlanDay {
            label: None,
            meals: vec![
                Meal {
                    name: None,
                    ingredients: vec![],
                },
                Meal {
                    name: None,
                    ingredients: vec![],
                },
            ],
        }],
    };
    let out = agg.build_coverage(&plan, None).await;
    assert_eq!(out.meals[0].meal, "day 1 meal 1");
    assert_eq!(out.meals[1].meal, "day 1 meal 2");
}
