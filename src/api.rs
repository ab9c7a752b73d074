use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::advisor::{tuning_suggestions, GeneratorConfig, PlanPreview, TuningSuggestion};
use crate::categories::CategoryMatcher;
use crate::guardrails::{self, RulesetProvider};
use crate::sanitize::{sanitize_pool, CandidatePool, SanitizedPool};
use crate::shopping::{
    MealPlan, MealPlanCoverage, PantryAvailability, ShoppingAggregator, ShoppingListResponse,
};

#[derive(Clone)]
pub struct AppState {
    pub matcher: Arc<dyn CategoryMatcher>,
    pub rulesets: Arc<dyn RulesetProvider>,
    pub aggregator: Arc<ShoppingAggregator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/pool/sanitize", post(sanitize_pool_handler))
        .route("/guardrails/terms", get(guardrails_terms))
        .route("/shopping/coverage", post(shopping_coverage))
        .route("/shopping/list", post(shopping_list))
        .route("/tuning/suggestions", post(tuning))
        .route("/debug/categories", get(debug_categories))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SanitizeReq {
    pool: CandidatePool,
    #[serde(default)]
    exclude_terms: Vec<String>,
    #[serde(default)]
    extra_exclude_terms: Option<Vec<String>>,
}

async fn sanitize_pool_handler(Json(body): Json<SanitizeReq>) -> Json<SanitizedPool> {
    let out = sanitize_pool(
        &body.pool,
        &body.exclude_terms,
        body.extra_exclude_terms.as_deref(),
    );
    Json(out)
}

#[derive(Deserialize)]
struct TermsQuery {
    diet: String,
    #[serde(default = "default_locale")]
    locale: String,
}

fn default_locale() -> String {
    "nl".to_string()
}

#[derive(serde::Serialize)]
struct TermsResp {
    diet: String,
    locale: String,
    terms: Vec<String>,
}

/// Hard-block terms for a diet. A ruleset load failure is a 502: plan
/// generation must fail closed rather than run without guardrails.
async fn guardrails_terms(
    State(state): State<AppState>,
    Query(q): Query<TermsQuery>,
) -> Result<Json<TermsResp>, (StatusCode, String)> {
    let terms =
        guardrails::load_hard_block_terms_for_diet(state.rulesets.as_ref(), &q.diet, &q.locale)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, diet = %q.diet, "ruleset load failed");
                (StatusCode::BAD_GATEWAY, format!("ruleset load failed: {e}"))
            })?;
    Ok(Json(TermsResp {
        diet: q.diet,
        locale: q.locale,
        terms,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanReq {
    plan: MealPlan,
    /// Explicit snapshot wins over `user_id`-driven loading.
    #[serde(default)]
    pantry: Option<Vec<PantryAvailability>>,
    #[serde(default)]
    user_id: Option<String>,
}

async fn shopping_coverage(
    State(state): State<AppState>,
    Json(body): Json<PlanReq>,
) -> Json<MealPlanCoverage> {
    let out = match (&body.pantry, &body.user_id) {
        (Some(pantry), _) => state.aggregator.build_coverage(&body.plan, Some(pantry)).await,
        (None, Some(user)) => state.aggregator.build_coverage_for_user(&body.plan, user).await,
        (None, None) => state.aggregator.build_coverage(&body.plan, None).await,
    };
    Json(out)
}

async fn shopping_list(
    State(state): State<AppState>,
    Json(body): Json<PlanReq>,
) -> Json<ShoppingListResponse> {
    let out = match (&body.pantry, &body.user_id) {
        (Some(pantry), _) => {
            state
                .aggregator
                .build_shopping_list(&body.plan, Some(pantry))
                .await
        }
        (None, Some(user)) => {
            state
                .aggregator
                .build_shopping_list_for_user(&body.plan, user)
                .await
        }
        (None, None) => state.aggregator.build_shopping_list(&body.plan, None).await,
    };
    Json(out)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TuningReq {
    preview: PlanPreview,
    #[serde(default)]
    config: GeneratorConfig,
}

async fn tuning(Json(body): Json<TuningReq>) -> Json<Vec<TuningSuggestion>> {
    Json(tuning_suggestions(&body.preview, &body.config))
}

#[derive(Deserialize)]
struct CategoriesQuery {
    name: String,
}

async fn debug_categories(
    State(state): State<AppState>,
    Query(q): Query<CategoriesQuery>,
) -> Json<Vec<String>> {
    Json(state.matcher.categories_of(&q.name))
}
