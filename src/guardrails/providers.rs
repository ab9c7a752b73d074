// src/guardrails/providers.rs
//! Ruleset providers: the hosted rule editor is abstracted behind
//! `RulesetProvider`; locally we read JSON files with an mtime-based reload so
//! rule edits show up without a restart.

use super::types::{PlannerMode, Ruleset};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::SystemTime;

pub const DEFAULT_RULESET_DIR: &str = "config/guardrails";
pub const ENV_RULESET_DIR: &str = "GUARDRAILS_CONFIG_DIR";

/// Loads the guardrails ruleset for a diet + planner mode + locale.
/// Transport/parse failures must surface as errors: meal-plan generation
/// fails closed when the rules cannot be loaded.
#[async_trait::async_trait]
pub trait RulesetProvider: Send + Sync {
    async fn load(&self, diet: &str, mode: PlannerMode, locale: &str) -> Result<Ruleset>;
}

/// Fixed ruleset returned for every diet/locale. Used in tests and seeding.
#[derive(Debug, Clone, Default)]
pub struct StaticRuleset {
    pub ruleset: Ruleset,
}

impl StaticRuleset {
    pub fn new(ruleset: Ruleset) -> Self {
        Self { ruleset }
    }
}

#[async_trait::async_trait]
impl RulesetProvider for StaticRuleset {
    async fn load(&self, _diet: &str, _mode: PlannerMode, _locale: &str) -> Result<Ruleset> {
        Ok(self.ruleset.clone())
    }
}

/// File-backed provider: `<dir>/<diet>.<mode>.<locale>.json`.
/// Parsed rulesets are cached per file and re-read when the mtime changes.
#[derive(Debug)]
pub struct FileRulesetProvider {
    dir: PathBuf,
    inner: RwLock<HashMap<PathBuf, CachedRuleset>>,
}

#[derive(Debug, Clone)]
struct CachedRuleset {
    ruleset: Ruleset,
    last_modified: Option<SystemTime>,
}

impl FileRulesetProvider {
    pub fn new(dir: Option<&Path>) -> Self {
        let dir = dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RULESET_DIR));
        Self {
            dir,
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve the directory from `GUARDRAILS_CONFIG_DIR` or the default.
    pub fn from_env() -> Self {
        let dir = std::env::var(ENV_RULESET_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_RULESET_DIR));
        Self::new(Some(&dir))
    }

    fn path_for(&self, diet: &str, mode: PlannerMode, locale: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}.{}.json", diet, mode.as_str(), locale))
    }

    fn load_file(path: &Path) -> Result<Ruleset> {
        let bytes = fs::read(path)
            .with_context(|| format!("reading ruleset file {}", path.display()))?;
        let ruleset: Ruleset = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing ruleset file {}", path.display()))?;
        Ok(ruleset)
    }
}

#[async_trait::async_trait]
impl RulesetProvider for FileRulesetProvider {
    async fn load(&self, diet: &str, mode: PlannerMode, locale: &str) -> Result<Ruleset> {
        let path = self.path_for(diet, mode, locale);
        let mtime = fs::metadata(&path).and_then(|m| m.modified()).ok();

        {
            let guard = self.inner.read().expect("ruleset cache poisoned");
            if let Some(cached) = guard.get(&path) {
                if cached.last_modified == mtime && mtime.is_some() {
                    return Ok(cached.ruleset.clone());
                }
            }
        }

        let ruleset = Self::load_file(&path)?;
        let mut guard = self.inner.write().expect("ruleset cache poisoned");
        guard.insert(
            path,
            CachedRuleset {
                ruleset: ruleset.clone(),
                last_modified: mtime,
            },
        );
        Ok(ruleset)
    }
}
