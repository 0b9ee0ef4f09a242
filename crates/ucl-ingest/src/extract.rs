//! Extraction batch job.
//!
//! Reads previously stored raw schedule payloads, normalizes every match
//! entry across all requested seasons, and writes one consolidated CSV
//! artifact back to the content store. Re-running against unchanged raw
//! payloads produces a byte-identical artifact at the same key.

use crate::normalizer::normalize;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};
use ucl_common::types::{ARTIFACT_COLUMNS, COMPETITION_NAME, COMPETITION_SHORT_NAME};
use ucl_common::{ContentStore, EndpointKind, MatchRecord, PartitionKey};

/// How many extracted records the report carries back for display.
const SAMPLE_SIZE: usize = 5;

/// Outcome of one extraction run.
///
/// `sample` exists for the caller to print; it is not part of the artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub records: usize,
    pub years_with_data: usize,
    pub years_skipped: usize,
    pub rejected: usize,
    pub artifact_key: String,
    pub sample: Vec<MatchRecord>,
}

/// Per-year extraction outcome, before any storage work.
#[derive(Debug, Default)]
struct YearExtraction {
    records: Vec<MatchRecord>,
    rejected: usize,
    schedule_present: bool,
}

pub struct ExtractionJob {
    store: ContentStore,
}

impl ExtractionJob {
    pub fn new(store: ContentStore) -> Self {
        Self { store }
    }

    /// Extract match records for the given seasons and publish the artifact.
    ///
    /// Seasons are processed in ascending order regardless of input order;
    /// within a season, records keep their discovery order. A season with a
    /// missing or unreadable payload is logged and skipped; it never aborts
    /// the batch.
    #[instrument(skip(self, years))]
    pub async fn run(&self, years: &[i32]) -> Result<ExtractionReport> {
        let mut ordered: Vec<i32> = years.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        info!("Extracting matches for {} seasons", ordered.len());

        let mut all_records = Vec::new();
        let mut rejected = 0;
        let mut years_with_data = 0;
        let mut years_skipped = 0;

        for year in ordered {
            let key = PartitionKey::for_season(EndpointKind::Schedule, year);
            let payload = match self.store.get_json(key.as_str()).await {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(year, "No readable schedule payload: {:#}", e);
                    years_skipped += 1;
                    continue;
                }
            };

            let extraction = collect_year_matches(&payload, year);
            if !extraction.schedule_present {
                warn!(year, "Payload has no schedule section");
                years_skipped += 1;
                continue;
            }

            info!(
                year,
                extracted = extraction.records.len(),
                rejected = extraction.rejected,
                "Season extracted"
            );
            years_with_data += 1;
            rejected += extraction.rejected;
            all_records.extend(extraction.records);
        }

        let body = render_csv(&all_records)?;
        let artifact_key = PartitionKey::match_artifact();
        let upload = self
            .store
            .put_bytes(
                artifact_key.as_str(),
                body,
                Some("text/csv".to_string()),
            )
            .await
            .context("Failed to upload match artifact")?;

        info!(
            records = all_records.len(),
            bytes = upload.size,
            key = %artifact_key,
            "Match artifact published"
        );

        Ok(ExtractionReport {
            records: all_records.len(),
            years_with_data,
            years_skipped,
            rejected,
            artifact_key: artifact_key.into_string(),
            sample: all_records.iter().take(SAMPLE_SIZE).cloned().collect(),
        })
    }
}

/// Walk one schedule payload's per-date match groups and normalize every
/// entry. Group iteration is deterministic (keys are date strings), which
/// keeps the artifact stable across runs.
fn collect_year_matches(payload: &Value, year: i32) -> YearExtraction {
    let mut out = YearExtraction::default();

    let Some(schedule) = payload.get("schedule").and_then(Value::as_object) else {
        return out;
    };
    out.schedule_present = true;

    for date_matches in schedule.values() {
        let Some(matches) = date_matches.as_array() else {
            continue;
        };
        for entry in matches {
            match normalize(entry, year) {
                Some(record) => out.records.push(record),
                None => out.rejected += 1,
            }
        }
    }

    out
}

/// Serialize records into the fixed-schema CSV artifact.
fn render_csv(records: &[MatchRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(ARTIFACT_COLUMNS)
        .context("Failed to write artifact header")?;

    for record in records {
        let completed = if record.completed { "true" } else { "false" };
        let home_score = record.home_score.to_string();
        let away_score = record.away_score.to_string();
        let season_year = record.season_year.to_string();

        writer
            .write_record([
                record.match_id.as_str(),
                record.match_datetime.as_str(),
                record.match_date.as_str(),
                completed,
                record.match_status.as_str(),
                record.home_team_id.as_str(),
                home_score.as_str(),
                record.away_team_id.as_str(),
                away_score.as_str(),
                COMPETITION_NAME,
                COMPETITION_SHORT_NAME,
                record.venue.as_str(),
                season_year.as_str(),
            ])
            .context("Failed to write artifact row")?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush artifact buffer: {}", e))
}
