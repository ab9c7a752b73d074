//! Meal-plan guardrails service — binary entrypoint.
//! Boots the Axum HTTP server, wiring routes, collaborators and metrics.

use std::sync::Arc;

use mealplan_guardrails::api::{create_router, AppState};
use mealplan_guardrails::categories::TermListMatcher;
use mealplan_guardrails::config::ServiceConfig;
use mealplan_guardrails::guardrails::FileRulesetProvider;
use mealplan_guardrails::metrics::Metrics;
use mealplan_guardrails::shopping::{
    CanonicalIdResolver, HttpNutritionApi, NoPantry, NutritionLookup, PantryProvider,
    ShoppingAggregator, StaticNutritionTable, TtlNutritionCache,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = ServiceConfig::from_env();
    let metrics = Metrics::init(cfg.nutrition_cache_ttl.as_millis() as u64);

    // --- Collaborators ---
    let matcher = Arc::new(TermListMatcher::from_env_or_default());
    let rulesets = Arc::new(FileRulesetProvider::from_env());
    let cache = Arc::new(TtlNutritionCache::new(cfg.nutrition_cache_ttl));

    let aggregator = match &cfg.nutrition_api_url {
        Some(url) => {
            tracing::info!(url, "using hosted nutrition API");
            let api = Arc::new(HttpNutritionApi::new(url.clone()));
            ShoppingAggregator::new(api.clone(), api.clone(), api, cache)
        }
        None => {
            let table = StaticNutritionTable::from_json_file(&cfg.nutrition_table_path)
                .unwrap_or_else(|e| {
                    tracing::warn!(
                        error = ?e,
                        path = %cfg.nutrition_table_path.display(),
                        "nutrition table unavailable, starting with an empty one"
                    );
                    StaticNutritionTable::default()
                });
            let table = Arc::new(table);
            let lookup: Arc<dyn NutritionLookup> = table.clone();
            let resolver: Arc<dyn CanonicalIdResolver> = table;
            let pantry: Arc<dyn PantryProvider> = Arc::new(NoPantry);
            ShoppingAggregator::new(lookup, resolver, pantry, cache)
        }
    };

    let state = AppState {
        matcher,
        rulesets,
        aggregator: Arc::new(aggregator),
    };
    let router = create_router(state).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "guardrails service listening");
    axum::serve(listener, router).await?;
    Ok(())
}
