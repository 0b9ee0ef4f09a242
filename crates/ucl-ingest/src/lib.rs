//! UCL Lake Ingest Library
//!
//! Pulls multi-season Champions League data from the upstream API, lands raw
//! payloads in the partitioned content store, and extracts the consolidated
//! match artifact.
//!
//! # Components
//!
//! - [`api`]: authenticated, rate-guarded HTTP client for the upstream API
//! - [`normalizer`]: raw match object -> canonical [`ucl_common::MatchRecord`]
//! - [`pipeline`]: the multi-year ingestion loop (teams, schedules, standings, rosters)
//! - [`extract`]: the batch job that turns stored schedules into the CSV artifact
//!
//! # Example
//!
//! ```no_run
//! use ucl_common::{storage::StoreConfig, ContentStore};
//! use ucl_ingest::{api::ApiClient, config::{ApiConfig, PipelineConfig}, pipeline::IngestionPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let api = ApiClient::new(&ApiConfig::from_env()?)?;
//!     let store = ContentStore::new(StoreConfig::from_env()?);
//!     let pipeline = IngestionPipeline::new(api, store, PipelineConfig::from_env()?);
//!     let summary = pipeline.run(2015, 2025).await?;
//!     println!("teams found: {}", summary.teams_found);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod extract;
pub mod normalizer;
pub mod pipeline;

pub use api::{ApiClient, ApiError};
pub use extract::{ExtractionJob, ExtractionReport};
pub use pipeline::{IngestionPipeline, IngestionSummary};
