// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod advisor;
pub mod api;
pub mod categories;
pub mod config;
pub mod guardrails;
pub mod metrics;
pub mod sanitize;
pub mod shopping;
pub mod units;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::categories::{normalize_name, CategoryMatcher, TermListMatcher};
pub use crate::sanitize::{
    dedupe, filter_by_exclude_terms, sanitize_pool, CandidatePool, IngredientCandidate,
    PoolMetrics, SanitizedPool,
};
pub use crate::units::canonicalize_unit;
