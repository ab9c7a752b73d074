// src/sanitize.rs
//! Candidate pool sanitation: dedup + exclude-term filtering before the plan
//! generator sees the pool. Pure over its inputs; the caller's pool is never
//! mutated. Removal counts go both into the returned metrics struct and into
//! Prometheus counters.

use crate::categories::normalize_name;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Category keys that get before/after counts in [`PoolMetrics`]. Other
/// categories in the pool are sanitized identically but stay out of the
/// metrics struct.
pub const METRIC_CATEGORIES: [&str; 4] = ["proteins", "vegetables", "fruits", "fats"];

/// One ingredient option produced by upstream pool building. Immutable here;
/// the sanitizer only filters and copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nevo_code: Option<String>,
    pub name: String,
    /// Display unit as delivered by the import; not interpreted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Category key → candidates. A mapping (not a fixed record) on purpose:
/// pools routinely carry free-form categories beyond the four metric ones.
pub type CandidatePool = BTreeMap<String, Vec<IngredientCandidate>>;

#[derive(Debug, Clone, PartialEq)]
pub struct DedupeOutcome {
    pub kept: Vec<IngredientCandidate>,
    pub removed_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<IngredientCandidate>,
    pub removed_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub proteins: usize,
    pub vegetables: usize,
    pub fruits: usize,
    pub fats: usize,
}

impl CategoryCounts {
    fn of(pool: &CandidatePool) -> Self {
        let len = |k: &str| pool.get(k).map(Vec::len).unwrap_or(0);
        Self {
            proteins: len("proteins"),
            vegetables: len("vegetables"),
            fruits: len("fruits"),
            fats: len("fats"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolMetrics {
    pub before: CategoryCounts,
    pub after: CategoryCounts,
    pub removed_duplicates: usize,
    pub removed_by_exclude_terms: usize,
    /// Present only when extra (guardrails-derived) terms were supplied and
    /// actually non-empty, so callers can tell "no guardrails" from "guardrails
    /// removed nothing".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_by_guardrails_terms: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedPool {
    pub pool: CandidatePool,
    pub metrics: PoolMetrics,
}

/// Identity for dedup: nevo code when non-empty, else the normalized name,
/// else the literal "unknown".
fn dedupe_key(c: &IngredientCandidate) -> String {
    if let Some(code) = c.nevo_code.as_deref() {
        if !code.trim().is_empty() {
            return code.trim().to_string();
        }
    }
    let n = normalize_name(&c.name);
    if n.is_empty() {
        "unknown".to_string()
    } else {
        n
    }
}

/// Drop duplicate candidates; first occurrence wins, order preserved.
pub fn dedupe(list: Vec<IngredientCandidate>) -> DedupeOutcome {
    let mut seen: HashSet<String> = HashSet::with_capacity(list.len());
    let total = list.len();
    let kept: Vec<_> = list
        .into_iter()
        .filter(|c| seen.insert(dedupe_key(c)))
        .collect();
    let removed_count = total - kept.len();
    DedupeOutcome {
        kept,
        removed_count,
    }
}

/// Remove candidates whose normalized name contains any normalized term.
/// An empty term list is a no-op and returns the input untouched.
pub fn filter_by_exclude_terms(
    list: Vec<IngredientCandidate>,
    terms: &[String],
) -> FilterOutcome {
    if terms.is_empty() {
        return FilterOutcome {
            kept: list,
            removed_count: 0,
        };
    }
    let normalized_terms: Vec<String> = terms
        .iter()
        .map(|t| normalize_name(t))
        .filter(|t| !t.is_empty())
        .collect();
    if normalized_terms.is_empty() {
        return FilterOutcome {
            kept: list,
            removed_count: 0,
        };
    }

    let total = list.len();
    let kept: Vec<_> = list
        .into_iter()
        .filter(|c| {
            let name = normalize_name(&c.name);
            let hit = normalized_terms.iter().any(|t| name.contains(t.as_str()));
            if hit {
                dev_log_removed(&c.name);
            }
            !hit
        })
        .collect();
    let removed_count = total - kept.len();
    FilterOutcome {
        kept,
        removed_count,
    }
}

/// Sanitize every category: dedup, then the primary exclude pass, then an
/// optional extra (guardrails) pass whose removals are counted separately.
pub fn sanitize_pool(
    pool: &CandidatePool,
    exclude_terms: &[String],
    extra_exclude_terms: Option<&[String]>,
) -> SanitizedPool {
    ensure_metrics_described();

    let before = CategoryCounts::of(pool);
    let mut removed_duplicates = 0usize;
    let mut removed_by_exclude = 0usize;
    let mut removed_by_guardrails = 0usize;

    let mut out: CandidatePool = BTreeMap::new();
    for (category, candidates) in pool {
        let deduped = dedupe(candidates.clone());
        removed_duplicates += deduped.removed_count;

        let filtered = filter_by_exclude_terms(deduped.kept, exclude_terms);
        removed_by_exclude += filtered.removed_count;

        let kept = match extra_exclude_terms {
            Some(extra) if !extra.is_empty() => {
                let second = filter_by_exclude_terms(filtered.kept, extra);
                removed_by_guardrails += second.removed_count;
                second.kept
            }
            _ => filtered.kept,
        };
        out.insert(category.clone(), kept);
    }

    counter!("pool_dedup_removed_total").increment(removed_duplicates as u64);
    counter!("pool_excluded_total").increment(removed_by_exclude as u64);
    counter!("pool_guardrails_excluded_total").increment(removed_by_guardrails as u64);

    let after = CategoryCounts::of(&out);
    let metrics = PoolMetrics {
        before,
        after,
        removed_duplicates,
        removed_by_exclude_terms: removed_by_exclude,
        removed_by_guardrails_terms: match extra_exclude_terms {
            Some(extra) if !extra.is_empty() => Some(removed_by_guardrails),
            _ => None,
        },
    };

    SanitizedPool { pool: out, metrics }
}

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "pool_dedup_removed_total",
            "Candidates removed from pools by deduplication."
        );
        describe_counter!(
            "pool_excluded_total",
            "Candidates removed by the primary exclude-term pass."
        );
        describe_counter!(
            "pool_guardrails_excluded_total",
            "Candidates removed by guardrails-derived exclude terms."
        );
    });
}

// Dev logging gate: POOL_DEV_LOG=1 AND a debug build.
fn dev_logging_enabled() -> bool {
    cfg!(debug_assertions) && std::env::var("POOL_DEV_LOG").ok().as_deref() == Some("1")
}

/// Never log raw ingredient names from client pools; only a short hash.
fn dev_log_removed(name: &str) {
    if !dev_logging_enabled() {
        return;
    }
    tracing::debug!(target: "sanitize", id = %anon_hash(name), "candidate removed by exclude term");
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(code: Option<&str>, name: &str) -> IngredientCandidate {
        IngredientCandidate {
            nevo_code: code.map(str::to_string),
            name: name.to_string(),
            unit: None,
        }
    }

    #[test]
    fn dedupe_prefers_nevo_code_and_keeps_first() {
        let out = dedupe(vec![
            cand(Some("50"), "Kipfilet"),
            cand(Some("50"), "Kipfilet (rauw)"),
            cand(None, "Tofu"),
            cand(None, "tofu  "),
        ]);
        assert_eq!(out.removed_count, 2);
        assert_eq!(out.kept.len(), 2);
        assert_eq!(out.kept[0].name, "Kipfilet");
        assert_eq!(out.kept[1].name, "Tofu");
    }

    #[test]
    fn dedupe_is_idempotent() {
        let list = vec![
            cand(Some("1"), "a"),
            cand(Some("1"), "b"),
            cand(None, "c"),
        ];
        let once = dedupe(list);
        let twice = dedupe(once.kept.clone());
        assert_eq!(twice.kept, once.kept);
        assert_eq!(twice.removed_count, 0);
    }

    #[test]
    fn empty_dedupe_keys_collapse_to_unknown() {
        let out = dedupe(vec![cand(Some("  "), "??"), cand(None, "!!")]);
        // Both normalize to the "unknown" key; first wins.
        assert_eq!(out.kept.len(), 1);
        assert_eq!(out.removed_count, 1);
    }

    #[test]
    fn empty_term_list_is_a_no_op() {
        let list = vec![cand(None, "Goudse Kaas")];
        let out = filter_by_exclude_terms(list.clone(), &[]);
        assert_eq!(out.kept, list);
        assert_eq!(out.removed_count, 0);
    }

    #[test]
    fn exclude_terms_match_normalized_substrings() {
        let out = filter_by_exclude_terms(
            vec![cand(None, "Goudse Kaas"), cand(None, "Appel")],
            &[" KAAS ".to_string()],
        );
        assert_eq!(out.kept.len(), 1);
        assert_eq!(out.kept[0].name, "Appel");
        assert_eq!(out.removed_count, 1);
    }

    #[test]
    fn sanitize_pool_counts_add_up() {
        let mut pool: CandidatePool = BTreeMap::new();
        pool.insert(
            "proteins".into(),
            vec![
                cand(Some("50"), "Kipfilet"),
                cand(Some("50"), "Kipfilet dubbel"),
                cand(None, "Goudse Kaas"),
                cand(None, "Tofu"),
            ],
        );
        pool.insert("vegetables".into(), vec![cand(Some("205"), "Broccoli")]);

        let before_total = 5;
        let res = sanitize_pool(&pool, &["kaas".to_string()], None);

        let after_total: usize = res.pool.values().map(Vec::len).sum();
        assert_eq!(
            res.metrics.removed_duplicates + res.metrics.removed_by_exclude_terms,
            before_total - after_total
        );
        assert_eq!(res.metrics.removed_duplicates, 1);
        assert_eq!(res.metrics.removed_by_exclude_terms, 1);
        assert_eq!(res.metrics.removed_by_guardrails_terms, None);
        assert_eq!(res.metrics.before.proteins, 4);
        assert_eq!(res.metrics.after.proteins, 2);
        // Caller's pool untouched.
        assert_eq!(pool.get("proteins").unwrap().len(), 4);
    }

    #[test]
    fn guardrails_terms_counted_separately() {
        let mut pool: CandidatePool = BTreeMap::new();
        pool.insert(
            "fats".into(),
            vec![cand(None, "Pindakaas"), cand(None, "Olijfolie")],
        );

        let res = sanitize_pool(&pool, &[], Some(&["pinda".to_string()]));
        assert_eq!(res.metrics.removed_by_exclude_terms, 0);
        assert_eq!(res.metrics.removed_by_guardrails_terms, Some(1));
        assert_eq!(res.pool.get("fats").unwrap().len(), 1);

        // Supplied-but-empty extra terms must not surface a counter.
        let res2 = sanitize_pool(&pool, &[], Some(&[]));
        assert_eq!(res2.metrics.removed_by_guardrails_terms, None);
    }

    #[test]
    fn non_metric_categories_are_sanitized_but_not_counted_in_sizes() {
        let mut pool: CandidatePool = BTreeMap::new();
        pool.insert(
            "snacks".into(),
            vec![cand(Some("9"), "Kaasblokjes"), cand(Some("9"), "Kaasblokjes")],
        );
        let res = sanitize_pool(&pool, &["kaas".to_string()], None);
        assert!(res.pool.get("snacks").unwrap().is_empty());
        assert_eq!(res.metrics.removed_duplicates, 1);
        assert_eq!(res.metrics.removed_by_exclude_terms, 1);
        assert_eq!(res.metrics.before, CategoryCounts::default());
        assert_eq!(res.metrics.after, CategoryCounts::default());
    }
}
