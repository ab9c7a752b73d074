// src/categories.rs
//! Ingredient category matching: free-text names → category tags.
//!
//! - Loads bilingual (EN/NL) term lists from TOML (embedded default, env override).
//! - Lookup is loose by design: exact equality OR substring containment in
//!   either direction, on normalized names. This mirrors how the coaching data
//!   was labelled historically and carries a known false-positive risk on short
//!   terms; `CategoryMatcher` isolates it so a stricter tokenizer can be swapped
//!   in without touching call sites.
//! - Per-category exception lists are consulted before the term lists and force
//!   a negative result (sweet potato is not a nightshade).
//! - No locale-aware diacritic folding: "café" and "cafe" stay distinct.

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_CATEGORY_TERMS: &str = include_str!("../config/categories.toml");
pub const ENV_CATEGORY_TERMS_PATH: &str = "CATEGORY_TERMS_PATH";

/// Normalize a free-text ingredient name to a comparison token:
/// lowercase, trim, non-alphanumerics → separators, collapsed and joined with `_`.
pub fn normalize_name(name: &str) -> String {
    static RE_NON_ALNUM: OnceCell<Regex> = OnceCell::new();
    let re = RE_NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("normalize regex"));
    let lowered = name.trim().to_lowercase();
    re.replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
struct CategoriesRoot {
    categories: Vec<CategoryCfg>,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryCfg {
    key: String,
    terms: Vec<String>,
    #[serde(default)]
    exceptions: Vec<String>,
}

/* ----------------------------
Matcher
---------------------------- */

/// Seam for category matching so the loose substring matcher can be replaced
/// by a stricter tokenizer later without touching call sites.
pub trait CategoryMatcher: Send + Sync {
    fn matches_category(&self, name: &str, category: &str) -> bool;

    /// All matching categories, in configuration order (deterministic).
    fn categories_of(&self, name: &str) -> Vec<String>;

    fn is_in_category(&self, name: &str, categories: &[&str]) -> bool {
        categories.iter().any(|c| self.matches_category(name, c))
    }
}

/// A category with pre-normalized terms and exceptions.
#[derive(Debug, Clone)]
struct CompiledCategory {
    key: String,
    terms: Vec<String>,
    exceptions: Vec<String>,
}

/// Production matcher backed by the TOML term lists.
#[derive(Debug)]
pub struct TermListMatcher {
    categories: Vec<CompiledCategory>,
}

impl TermListMatcher {
    /// Parse from a TOML string. Terms and exceptions are normalized once here.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let root: CategoriesRoot = toml::from_str(toml_str)?;
        let categories = root
            .categories
            .into_iter()
            .map(|c| CompiledCategory {
                key: c.key,
                terms: c
                    .terms
                    .iter()
                    .map(|t| normalize_name(t))
                    .filter(|t| !t.is_empty())
                    .collect(),
                exceptions: c
                    .exceptions
                    .iter()
                    .map(|t| normalize_name(t))
                    .filter(|t| !t.is_empty())
                    .collect(),
            })
            .collect();
        Ok(Self { categories })
    }

    /// Load from `CATEGORY_TERMS_PATH` when set and readable, otherwise the
    /// embedded default table. A broken override file falls back too, with a
    /// warning, so a bad deploy cannot blank the matcher.
    pub fn from_env_or_default() -> Self {
        if let Ok(path) = std::env::var(ENV_CATEGORY_TERMS_PATH) {
            let path = PathBuf::from(path);
            match fs::read_to_string(&path).map_err(anyhow::Error::from).and_then(|s| Self::from_toml_str(&s)) {
                Ok(m) => return m,
                Err(e) => {
                    tracing::warn!(error = ?e, path = %path.display(), "category terms override unusable, using embedded table");
                }
            }
        }
        Self::from_toml_str(DEFAULT_CATEGORY_TERMS).expect("embedded category table is valid")
    }

    /// Shared matcher built from the embedded table (used by the predicate helpers).
    pub fn builtin() -> &'static TermListMatcher {
        static BUILTIN: Lazy<TermListMatcher> = Lazy::new(|| {
            TermListMatcher::from_toml_str(DEFAULT_CATEGORY_TERMS)
                .expect("embedded category table is valid")
        });
        &BUILTIN
    }

    fn category(&self, key: &str) -> Option<&CompiledCategory> {
        self.categories.iter().find(|c| c.key == key)
    }

    fn matches_compiled(&self, normalized: &str, cat: &CompiledCategory) -> bool {
        if normalized.is_empty() {
            return false;
        }
        // Exceptions first: a documented biological/semantic carve-out always wins.
        if cat
            .exceptions
            .iter()
            .any(|e| loose_match(normalized, e))
        {
            return false;
        }
        cat.terms.iter().any(|t| loose_match(normalized, t))
    }
}

/// Exact equality or containment in either direction. Deliberately loose.
fn loose_match(candidate: &str, term: &str) -> bool {
    candidate == term || candidate.contains(term) || term.contains(candidate)
}

impl CategoryMatcher for TermListMatcher {
    fn matches_category(&self, name: &str, category: &str) -> bool {
        let normalized = normalize_name(name);
        match self.category(category) {
            Some(cat) => self.matches_compiled(&normalized, cat),
            // Unknown categories are not an error, just a non-match.
            None => false,
        }
    }

    fn categories_of(&self, name: &str) -> Vec<String> {
        let normalized = normalize_name(name);
        self.categories
            .iter()
            .filter(|c| self.matches_compiled(&normalized, c))
            .map(|c| c.key.clone())
            .collect()
    }
}

/* ----------------------------
Predicate helpers over the built-in table
---------------------------- */

pub fn is_nightshade(name: &str) -> bool {
    TermListMatcher::builtin().matches_category(name, "nightshade")
}

pub fn is_dairy(name: &str) -> bool {
    TermListMatcher::builtin().matches_category(name, "dairy")
}

pub fn is_grain(name: &str) -> bool {
    TermListMatcher::builtin().matches_category(name, "grain")
}

pub fn is_legume(name: &str) -> bool {
    TermListMatcher::builtin().matches_category(name, "legume")
}

pub fn is_nut(name: &str) -> bool {
    TermListMatcher::builtin().matches_category(name, "nut")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_and_underscores() {
        assert_eq!(normalize_name("  Goudse Kaas (48+) "), "goudse_kaas_48");
        assert_eq!(normalize_name("Zoete aardappel"), "zoete_aardappel");
        assert_eq!(normalize_name("---"), "");
    }

    #[test]
    fn potato_is_nightshade_sweet_potato_is_not() {
        assert!(is_nightshade("aardappel"));
        assert!(is_nightshade("Aardappelen, gekookt"));
        assert!(!is_nightshade("zoete aardappel"));
        assert!(!is_nightshade("Sweet Potato"));
        assert!(!is_nightshade("bataat"));
    }

    #[test]
    fn black_pepper_is_not_a_nightshade() {
        assert!(is_nightshade("chili peper"));
        assert!(!is_nightshade("zwarte peper"));
    }

    #[test]
    fn dairy_exceptions_cover_plant_milks() {
        assert!(is_dairy("halfvolle melk"));
        assert!(is_dairy("Goudse kaas"));
        assert!(!is_dairy("kokosmelk"));
        assert!(!is_dairy("pindakaas"));
    }

    #[test]
    fn loose_matching_works_both_directions() {
        let m = TermListMatcher::builtin();
        // Candidate contains term.
        assert!(m.matches_category("tomatenpuree", "nightshade"));
        // Term contains candidate.
        assert!(m.matches_category("tomaat", "nightshade"));
    }

    #[test]
    fn unknown_category_is_false_not_error() {
        let m = TermListMatcher::builtin();
        assert!(!m.matches_category("tomaat", "no_such_category"));
        assert!(!m.is_in_category("tomaat", &["nope", "also_nope"]));
    }

    #[test]
    fn categories_of_is_in_config_order() {
        let m = TermListMatcher::builtin();
        let cats = m.categories_of("tofu");
        assert!(cats.contains(&"legume".to_string()));
        assert!(cats.contains(&"soy".to_string()));
        let legume_pos = cats.iter().position(|c| c == "legume").unwrap();
        let soy_pos = cats.iter().position(|c| c == "soy").unwrap();
        assert!(legume_pos < soy_pos, "config order must be preserved");
    }

    #[test]
    fn custom_table_via_toml_str() {
        let m = TermListMatcher::from_toml_str(
            r#"
[[categories]]
key = "citrus"
terms = ["lemon", "citroen", "orange", "sinaasappel"]
exceptions = ["orange juice"]
"#,
        )
        .unwrap();
        assert!(m.matches_category("Citroen", "citrus"));
        assert!(!m.matches_category("orange juice", "citrus"));
    }
}
