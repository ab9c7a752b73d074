// src/shopping/lookup.rs
//! Collaborator traits for the shopping aggregator, plus the TTL cache that
//! backs repeated nutrition lookups within a process.

use crate::units::canonicalize_unit;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::types::PantryAvailability;

pub const DEFAULT_NUTRITION_CACHE_TTL: Duration = Duration::from_secs(600);

/// One row of the food-composition table, as much of it as the aggregator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionRecord {
    pub code: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub food_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl NutritionRecord {
    /// Normalize the display unit so "mcg"/"µg" variants compare equal downstream.
    pub fn with_canonical_unit(mut self) -> Self {
        self.unit = canonicalize_unit(self.unit.as_deref());
        self
    }
}

/// Food-composition lookup. `Ok(None)` for unknown codes; errors are
/// transport-level only.
#[async_trait::async_trait]
pub trait NutritionLookup: Send + Sync {
    async fn get_by_code(&self, code: u32) -> Result<Option<NutritionRecord>>;
}

/// Batch resolver from nevo codes to canonical ingredient ids. Codes absent
/// from the returned map simply have no canonical id; that is not an error.
#[async_trait::async_trait]
pub trait CanonicalIdResolver: Send + Sync {
    async fn resolve_ids_by_codes(&self, codes: &[String]) -> Result<HashMap<String, String>>;
}

/// Pantry snapshot provider. Fails open: implementations log internal errors
/// and return an empty list, so "no pantry data" and "empty pantry" are the
/// same thing to callers.
#[async_trait::async_trait]
pub trait PantryProvider: Send + Sync {
    async fn load_availability_by_codes(
        &self,
        user_id: &str,
        codes: &[String],
    ) -> Vec<PantryAvailability>;
}

/// Cache seam for nutrition lookups, injected into the aggregator so tests can
/// substitute a deterministic or bounded implementation.
pub trait NutritionCache: Send + Sync {
    fn get(&self, code: u32) -> Option<NutritionRecord>;
    fn put(&self, record: NutritionRecord);
    fn ttl(&self) -> Duration;
}

/// Production cache: process-lifetime map with a TTL check on read. No size
/// bound; unbounded growth over a long-lived process is a known gap, which is
/// why this sits behind the `NutritionCache` seam instead of being hardwired.
#[derive(Debug)]
pub struct TtlNutritionCache {
    ttl: Duration,
    inner: Mutex<HashMap<u32, (NutritionRecord, Instant)>>,
}

impl TtlNutritionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for TtlNutritionCache {
    fn default() -> Self {
        Self::new(DEFAULT_NUTRITION_CACHE_TTL)
    }
}

impl NutritionCache for TtlNutritionCache {
    fn get(&self, code: u32) -> Option<NutritionRecord> {
        let mut guard = self.inner.lock().expect("nutrition cache poisoned");
        match guard.get(&code) {
            Some((record, stored_at)) if stored_at.elapsed() < self.ttl => Some(record.clone()),
            Some(_) => {
                guard.remove(&code);
                None
            }
            None => None,
        }
    }

    fn put(&self, record: NutritionRecord) {
        let mut guard = self.inner.lock().expect("nutrition cache poisoned");
        guard.insert(record.code, (record, Instant::now()));
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(code: u32, name: &str) -> NutritionRecord {
        NutritionRecord {
            code,
            name: name.to_string(),
            food_group: None,
            unit: None,
        }
    }

    #[test]
    fn cache_hit_within_ttl() {
        let cache = TtlNutritionCache::new(Duration::from_secs(60));
        cache.put(rec(101, "Broccoli"));
        assert_eq!(cache.get(101).unwrap().name, "Broccoli");
        assert_eq!(cache.get(999), None);
    }

    #[test]
    fn expired_entries_are_dropped_on_read() {
        let cache = TtlNutritionCache::new(Duration::from_secs(0));
        cache.put(rec(101, "Broccoli"));
        assert_eq!(cache.get(101), None);
    }

    #[test]
    fn record_unit_is_canonicalized() {
        let r = NutritionRecord {
            code: 1,
            name: "Vitamine B12".into(),
            food_group: None,
            unit: Some("µg".into()),
        }
        .with_canonical_unit();
        assert_eq!(r.unit.as_deref(), Some("ug"));
    }
}
