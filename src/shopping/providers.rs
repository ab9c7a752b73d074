// src/shopping/providers.rs
//! Concrete collaborators: a JSON-file table for local runs and tests, and a
//! thin client for the hosted nutrition database's REST endpoints.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use super::lookup::{CanonicalIdResolver, NutritionLookup, NutritionRecord, PantryProvider};
use super::types::PantryAvailability;

/* ----------------------------
Static JSON table
---------------------------- */

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableFile {
    #[serde(default)]
    records: Vec<NutritionRecord>,
    /// nevo code → canonical ingredient id.
    #[serde(default)]
    canonical_ids: HashMap<String, String>,
}

/// In-memory nutrition table, loaded once from JSON. Implements both the
/// lookup and the canonical-id resolver so the binary can run without the
/// hosted database.
#[derive(Debug, Clone, Default)]
pub struct StaticNutritionTable {
    records: HashMap<u32, NutritionRecord>,
    canonical_ids: HashMap<String, String>,
}

impl StaticNutritionTable {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: TableFile = serde_json::from_str(json).context("parsing nutrition table")?;
        Ok(Self::from_parts(file.records, file.canonical_ids))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!("reading nutrition table {}", path.as_ref().display())
        })?;
        Self::from_json_str(&s)
    }

    pub fn from_parts(
        records: Vec<NutritionRecord>,
        canonical_ids: HashMap<String, String>,
    ) -> Self {
        let records = records
            .into_iter()
            .map(|r| (r.code, r.with_canonical_unit()))
            .collect();
        Self {
            records,
            canonical_ids,
        }
    }
}

#[async_trait::async_trait]
impl NutritionLookup for StaticNutritionTable {
    async fn get_by_code(&self, code: u32) -> Result<Option<NutritionRecord>> {
        Ok(self.records.get(&code).cloned())
    }
}

#[async_trait::async_trait]
impl CanonicalIdResolver for StaticNutritionTable {
    async fn resolve_ids_by_codes(&self, codes: &[String]) -> Result<HashMap<String, String>> {
        Ok(codes
            .iter()
            .filter_map(|c| {
                self.canonical_ids
                    .get(c)
                    .map(|id| (c.clone(), id.clone()))
            })
            .collect())
    }
}

/* ----------------------------
Hosted REST client
---------------------------- */

/// Client for the hosted nutrition database REST API:
/// `GET  {base}/nevo/{code}`          → record or 404
/// `POST {base}/canonical/resolve`    → { "<code>": "<id>", ... }
/// `GET  {base}/pantry/{user}?codes=` → [PantryAvailability]
pub struct HttpNutritionApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpNutritionApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("mealplan-guardrails/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait::async_trait]
impl NutritionLookup for HttpNutritionApi {
    async fn get_by_code(&self, code: u32) -> Result<Option<NutritionRecord>> {
        let url = format!("{}/nevo/{}", self.base_url, code);
        let resp = self.http.get(&url).send().await.context("nevo lookup")?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = resp.error_for_status().context("nevo lookup status")?;
        let record: NutritionRecord = resp.json().await.context("nevo lookup body")?;
        Ok(Some(record))
    }
}

#[async_trait::async_trait]
impl CanonicalIdResolver for HttpNutritionApi {
    async fn resolve_ids_by_codes(&self, codes: &[String]) -> Result<HashMap<String, String>> {
        let url = format!("{}/canonical/resolve", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "codes": codes }))
            .send()
            .await
            .context("canonical resolve")?
            .error_for_status()
            .context("canonical resolve status")?;
        let map: HashMap<String, String> = resp.json().await.context("canonical resolve body")?;
        Ok(map)
    }
}

#[async_trait::async_trait]
impl PantryProvider for HttpNutritionApi {
    /// Fails open: any transport error is logged and treated as "no pantry data".
    async fn load_availability_by_codes(
        &self,
        user_id: &str,
        codes: &[String],
    ) -> Vec<PantryAvailability> {
        let url = format!("{}/pantry/{}", self.base_url, user_id);
        let result = async {
            let resp = self
                .http
                .get(&url)
                .query(&[("codes", codes.join(","))])
                .send()
                .await?
                .error_for_status()?;
            resp.json::<Vec<PantryAvailability>>().await
        }
        .await;

        match result {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = ?e, user_id, "pantry load failed, treating as empty");
                Vec::new()
            }
        }
    }
}

/// No pantry integration configured: every load returns an empty snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPantry;

#[async_trait::async_trait]
impl PantryProvider for NoPantry {
    async fn load_availability_by_codes(
        &self,
        _user_id: &str,
        _codes: &[String],
    ) -> Vec<PantryAvailability> {
        Vec::new()
    }
}
