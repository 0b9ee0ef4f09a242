//! Multi-year ingestion pipeline.
//!
//! Walks the configured season range in ascending order, fetching the team
//! list, schedule, and standings for each year and landing every non-empty
//! payload at its partition key. Team identifiers discovered along the way
//! feed the roster phase at the end of the run.
//!
//! Failure policy: one bad fetch or upload is logged and skipped. The loop
//! itself never aborts; the only fatal condition is missing credentials,
//! which is caught at config time before this module runs.

use crate::api::ApiClient;
use crate::config::PipelineConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{info, instrument, warn};
use ucl_common::{ContentStore, EndpointKind, PartitionKey};

/// `(team_id, season_year)` pairs discovered across the run.
///
/// Threaded explicitly through each year's processing step; ordered so the
/// roster phase selects the same subset on every run.
pub type EntitySet = BTreeSet<(String, i32)>;

/// Per-unit outcome counters for one run.
#[derive(Debug, Default, Clone, Copy)]
struct FetchCounters {
    /// Fetches that came back non-200 or failed in transport.
    failures: usize,
    /// Fetches that succeeded but carried no data.
    empty: usize,
    /// Store writes that failed (payload dropped, loop continued).
    upload_failures: usize,
}

/// Final summary of one ingestion run, also written to the content store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionSummary {
    pub ingestion_date: String,
    pub years_processed: Vec<i32>,
    pub total_years: usize,
    pub teams_found: usize,
    pub rosters_fetched: usize,
    pub fetch_failures: usize,
    pub empty_payloads: usize,
    pub upload_failures: usize,
}

pub struct IngestionPipeline {
    api: ApiClient,
    store: ContentStore,
    config: PipelineConfig,
}

impl IngestionPipeline {
    pub fn new(api: ApiClient, store: ContentStore, config: PipelineConfig) -> Self {
        Self { api, store, config }
    }

    /// Run the full ingestion over `[year_start, year_end]` inclusive.
    #[instrument(skip(self))]
    pub async fn run(&self, year_start: i32, year_end: i32) -> Result<IngestionSummary> {
        anyhow::ensure!(
            year_start <= year_end,
            "Season range start {} is after end {}",
            year_start,
            year_end
        );

        info!("Starting ingestion for seasons {}..={}", year_start, year_end);

        let mut entities = EntitySet::new();
        let mut counters = FetchCounters::default();
        let mut years_processed = Vec::new();

        for year in year_start..=year_end {
            info!(year, "Processing season");
            (entities, counters) = self.ingest_year(year, entities, counters).await;
            years_processed.push(year);
            tokio::time::sleep(Duration::from_millis(self.config.year_pacing_ms)).await;
        }

        let rosters_fetched = self.fetch_rosters(&entities, &mut counters).await;

        let summary = IngestionSummary {
            ingestion_date: Utc::now().to_rfc3339(),
            total_years: years_processed.len(),
            years_processed,
            teams_found: entities.len(),
            rosters_fetched,
            fetch_failures: counters.failures,
            empty_payloads: counters.empty,
            upload_failures: counters.upload_failures,
        };

        let summary_value =
            serde_json::to_value(&summary).context("Failed to serialize ingestion summary")?;
        self.store
            .put_json(PartitionKey::ingestion_summary().as_str(), &summary_value)
            .await
            .context("Failed to write ingestion summary")?;

        info!(
            years = summary.total_years,
            teams = summary.teams_found,
            rosters = summary.rosters_fetched,
            failures = summary.fetch_failures,
            empty = summary.empty_payloads,
            "Ingestion complete"
        );

        Ok(summary)
    }

    /// Ingest one season: teams, schedule, standings.
    ///
    /// Takes ownership of the entity accumulator and hands it back updated.
    async fn ingest_year(
        &self,
        year: i32,
        mut entities: EntitySet,
        mut counters: FetchCounters,
    ) -> (EntitySet, FetchCounters) {
        let year_param = year.to_string();

        // Team list, with the alternate endpoint spelling as fallback.
        let teams = self
            .fetch_first(
                &[
                    ("team/list", vec![("year", year_param.clone())]),
                    ("teams/list", vec![("year", year_param.clone())]),
                ],
                &mut counters,
            )
            .await;
        if let Some(payload) = teams {
            self.store_payload(EndpointKind::Teams, year, &payload, &mut counters)
                .await;
            let before = entities.len();
            collect_team_entities(&payload, year, &mut entities);
            info!(year, discovered = entities.len() - before, "Collected team ids");
        }

        // Schedule; some seasons answer to `season` instead of `year`.
        let schedule = self
            .fetch_first(
                &[
                    ("schedule", vec![("year", year_param.clone())]),
                    ("schedule", vec![("season", year_param.clone())]),
                ],
                &mut counters,
            )
            .await;
        if let Some(payload) = schedule {
            self.store_payload(EndpointKind::Schedule, year, &payload, &mut counters)
                .await;
        }

        let standings = self
            .fetch_first(
                &[
                    ("standings", vec![("year", year_param.clone())]),
                    ("standings", vec![("season", year_param)]),
                ],
                &mut counters,
            )
            .await;
        if let Some(payload) = standings {
            self.store_payload(EndpointKind::Standings, year, &payload, &mut counters)
                .await;
        }

        (entities, counters)
    }

    /// Roster phase: fetch one roster per selected entity.
    ///
    /// Selection is bounded (recent-year cutoff, then a hard limit) to keep
    /// the call volume inside the API quota.
    async fn fetch_rosters(&self, entities: &EntitySet, counters: &mut FetchCounters) -> usize {
        let selected: Vec<&(String, i32)> = entities
            .iter()
            .filter(|(_, year)| *year >= self.config.roster_year_cutoff)
            .take(self.config.roster_limit)
            .collect();

        info!(
            candidates = selected.len(),
            cutoff = self.config.roster_year_cutoff,
            "Fetching team rosters"
        );

        let mut fetched = 0;
        for (team_id, year) in selected {
            let params = [
                ("teamId", team_id.clone()),
                ("year", year.to_string()),
            ];
            match self.api.fetch("team/roster", &params).await {
                Ok(payload) if !is_empty_payload(&payload) => {
                    let key = PartitionKey::for_roster(team_id, *year);
                    match self.store.put_json(key.as_str(), &payload).await {
                        Ok(_) => fetched += 1,
                        Err(e) => {
                            warn!(team_id = %team_id, year, "Roster upload failed: {:#}", e);
                            counters.upload_failures += 1;
                        }
                    }
                }
                Ok(_) => {
                    warn!(team_id = %team_id, year, "Roster payload was empty");
                    counters.empty += 1;
                }
                Err(e) => {
                    warn!(team_id = %team_id, year, "Roster fetch failed: {}", e);
                    counters.failures += 1;
                }
            }
            tokio::time::sleep(Duration::from_millis(self.config.roster_pacing_ms)).await;
        }

        fetched
    }

    /// Try each `(endpoint, params)` attempt in order until one yields a
    /// non-empty payload. Failures and empties are counted, never raised.
    async fn fetch_first(
        &self,
        attempts: &[(&str, Vec<(&str, String)>)],
        counters: &mut FetchCounters,
    ) -> Option<Value> {
        for (endpoint, params) in attempts {
            match self.api.fetch(endpoint, params).await {
                Ok(payload) if !is_empty_payload(&payload) => return Some(payload),
                Ok(_) => {
                    warn!(endpoint, "Payload was empty, trying next variant");
                    counters.empty += 1;
                }
                Err(e) => {
                    warn!(endpoint, "Fetch failed: {}", e);
                    counters.failures += 1;
                }
            }
        }
        None
    }

    async fn store_payload(
        &self,
        kind: EndpointKind,
        year: i32,
        payload: &Value,
        counters: &mut FetchCounters,
    ) {
        let key = PartitionKey::for_season(kind, year);
        if let Err(e) = self.store.put_json(key.as_str(), payload).await {
            warn!(%kind, year, "Upload failed: {:#}", e);
            counters.upload_failures += 1;
        }
    }
}

/// True when a payload carries no data worth storing.
fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Pull `(team_id, year)` pairs out of a team-list payload.
///
/// Tolerates both response shapes the upstream API serves: a bare list of
/// team objects, or an object exposing the list under `teams` or `data`.
/// Team ids may arrive as `id`, `teamId`, or `team_id`, string or number.
fn collect_team_entities(payload: &Value, year: i32, entities: &mut EntitySet) {
    let teams = match payload {
        Value::Array(items) => Some(items.as_slice()),
        Value::Object(_) => payload
            .get("teams")
            .and_then(Value::as_array)
            .filter(|items| !items.is_empty())
            .or_else(|| payload.get("data").and_then(Value::as_array))
            .map(Vec::as_slice),
        _ => None,
    };

    for team in teams.unwrap_or(&[]) {
        if !team.is_object() {
            continue;
        }
        let id = ["id", "teamId", "team_id"]
            .iter()
            .find_map(|key| match team.get(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            });
        if let Some(id) = id {
            entities.insert((id, year));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collect_entities_from_bare_list() {
        let payload = json!([
            {"id": "83", "name": "Barcelona"},
            {"id": "86", "name": "Real Madrid"}
        ]);
        let mut entities = EntitySet::new();
        collect_team_entities(&payload, 2024, &mut entities);

        assert_eq!(entities.len(), 2);
        assert!(entities.contains(&("83".to_string(), 2024)));
    }

    #[test]
    fn test_collect_entities_from_object_shapes() {
        let with_teams = json!({"teams": [{"teamId": 359}]});
        let with_data = json!({"data": [{"team_id": "731"}]});

        let mut entities = EntitySet::new();
        collect_team_entities(&with_teams, 2023, &mut entities);
        collect_team_entities(&with_data, 2024, &mut entities);

        assert!(entities.contains(&("359".to_string(), 2023)));
        assert!(entities.contains(&("731".to_string(), 2024)));
    }

    #[test]
    fn test_collect_entities_empty_teams_key_falls_back_to_data() {
        let payload = json!({"teams": [], "data": [{"id": "5"}]});
        let mut entities = EntitySet::new();
        collect_team_entities(&payload, 2022, &mut entities);

        assert_eq!(entities.len(), 1);
        assert!(entities.contains(&("5".to_string(), 2022)));
    }

    #[test]
    fn test_collect_entities_ignores_malformed_entries() {
        let payload = json!([{"name": "no id"}, "not-an-object", {"id": "ok"}]);
        let mut entities = EntitySet::new();
        collect_team_entities(&payload, 2021, &mut entities);

        assert_eq!(entities.len(), 1);
        assert!(entities.contains(&("ok".to_string(), 2021)));
    }

    #[test]
    fn test_same_team_across_years_is_distinct() {
        let payload = json!([{"id": "83"}]);
        let mut entities = EntitySet::new();
        collect_team_entities(&payload, 2023, &mut entities);
        collect_team_entities(&payload, 2024, &mut entities);

        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_is_empty_payload() {
        assert!(is_empty_payload(&json!(null)));
        assert!(is_empty_payload(&json!({})));
        assert!(is_empty_payload(&json!([])));
        assert!(!is_empty_payload(&json!({"teams": []})));
        assert!(!is_empty_payload(&json!([1])));
    }
}
