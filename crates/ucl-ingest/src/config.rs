//! Ingestion configuration
//!
//! Everything is env-driven with sensible defaults; the only hard
//! requirement is the API key. A run with no credentials aborts here,
//! before any network call is made.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Upstream API host when `UCL_API_HOST` is unset.
pub const DEFAULT_API_HOST: &str = "uefa-champions-league1.p.rapidapi.com";

/// First and last season fetched when `UCL_YEAR_START`/`UCL_YEAR_END` are unset.
pub const DEFAULT_YEAR_START: i32 = 2015;
pub const DEFAULT_YEAR_END: i32 = 2025;

/// Upstream API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL requests are issued against, normally `https://{host}`.
    /// Separate from `host` so tests can point the client at a local server
    /// while keeping the host header intact.
    pub base_url: String,

    /// Value of the `X-RapidAPI-Host` header.
    pub host: String,

    /// Value of the `X-RapidAPI-Key` header.
    pub api_key: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Minimum spacing between any two API calls, in milliseconds.
    pub min_interval_ms: u64,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("RAPIDAPI_KEY")
            .context("RAPIDAPI_KEY is not set; refusing to start without API credentials")?;

        let host = env::var("UCL_API_HOST").unwrap_or_else(|_| DEFAULT_API_HOST.to_string());

        Ok(Self {
            base_url: format!("https://{}", host),
            host,
            api_key,
            timeout_secs: env_parsed("UCL_API_TIMEOUT_SECS", 30),
            min_interval_ms: env_parsed("UCL_API_MIN_INTERVAL_MS", 250),
        })
    }

    /// Redirect requests at a different base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Inclusive season range the pipelines operate over.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SeasonRange {
    pub start: i32,
    pub end: i32,
}

impl SeasonRange {
    pub fn from_env() -> Result<Self> {
        let range = Self {
            start: env_parsed("UCL_YEAR_START", DEFAULT_YEAR_START),
            end: env_parsed("UCL_YEAR_END", DEFAULT_YEAR_END),
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.start <= self.end,
            "Season range start {} is after end {}",
            self.start,
            self.end
        );
        Ok(())
    }

    pub fn years(&self) -> Vec<i32> {
        (self.start..=self.end).collect()
    }
}

/// Knobs for the ingestion pipeline's pacing and roster phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub seasons: SeasonRange,

    /// Pause between season iterations, in milliseconds.
    pub year_pacing_ms: u64,

    /// Pause between roster fetches, in milliseconds.
    pub roster_pacing_ms: u64,

    /// Rosters are only fetched for teams discovered in this season or later.
    pub roster_year_cutoff: i32,

    /// Upper bound on roster fetches per run.
    pub roster_limit: usize,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            seasons: SeasonRange::from_env()?,
            year_pacing_ms: env_parsed("UCL_YEAR_PACING_MS", 1000),
            roster_pacing_ms: env_parsed("UCL_ROSTER_PACING_MS", 500),
            roster_year_cutoff: env_parsed("UCL_ROSTER_YEAR_CUTOFF", 2023),
            roster_limit: env_parsed("UCL_ROSTER_LIMIT", 10),
        })
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
