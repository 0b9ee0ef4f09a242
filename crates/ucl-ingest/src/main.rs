//! UCL Ingest - data acquisition and extraction tool

use anyhow::Result;
use clap::Parser;
use tracing::info;
use ucl_common::logging::{init_logging, LogConfig, LogLevel};
use ucl_common::storage::StoreConfig;
use ucl_common::ContentStore;
use ucl_ingest::api::ApiClient;
use ucl_ingest::config::{ApiConfig, PipelineConfig, SeasonRange};
use ucl_ingest::extract::ExtractionJob;
use ucl_ingest::pipeline::IngestionPipeline;

#[derive(Parser, Debug)]
#[command(name = "ucl-ingest")]
#[command(author, version, about = "Champions League data ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Verify API credentials with a single probe call
    Check,

    /// Fetch raw payloads for the season range into the content store
    Ingest {
        /// First season (defaults to UCL_YEAR_START)
        #[arg(long)]
        start_year: Option<i32>,

        /// Last season (defaults to UCL_YEAR_END)
        #[arg(long)]
        end_year: Option<i32>,
    },

    /// Build the consolidated match artifact from stored schedules
    Extract {
        /// First season (defaults to UCL_YEAR_START)
        #[arg(long)]
        start_year: Option<i32>,

        /// Last season (defaults to UCL_YEAR_END)
        #[arg(long)]
        end_year: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::from_env_or(
        LogConfig::default()
            .with_level(log_level)
            .with_file_prefix("ucl-ingest"),
    )?;
    init_logging(&log_config)?;

    match cli.command {
        Command::Check => {
            let api_config = ApiConfig::from_env()?;
            let seasons = SeasonRange::from_env()?;
            let client = ApiClient::new(&api_config)?;

            client.check(seasons.end).await?;
            info!("API connection OK");
        }
        Command::Ingest {
            start_year,
            end_year,
        } => {
            let api_config = ApiConfig::from_env()?;
            let pipeline_config = PipelineConfig::from_env()?;
            let start = start_year.unwrap_or(pipeline_config.seasons.start);
            let end = end_year.unwrap_or(pipeline_config.seasons.end);

            let client = ApiClient::new(&api_config)?;
            let store = ContentStore::new(StoreConfig::from_env()?);
            let pipeline = IngestionPipeline::new(client, store, pipeline_config);

            let summary = pipeline.run(start, end).await?;
            info!(
                "Processed {} seasons, {} team-year pairs, {} rosters ({} fetch failures, {} empty payloads)",
                summary.total_years,
                summary.teams_found,
                summary.rosters_fetched,
                summary.fetch_failures,
                summary.empty_payloads,
            );
        }
        Command::Extract {
            start_year,
            end_year,
        } => {
            let seasons = SeasonRange::from_env()?;
            let start = start_year.unwrap_or(seasons.start);
            let end = end_year.unwrap_or(seasons.end);
            let years: Vec<i32> = (start..=end).collect();

            let store = ContentStore::new(StoreConfig::from_env()?);
            let job = ExtractionJob::new(store);

            let report = job.run(&years).await?;
            info!(
                "Extracted {} records across {} seasons ({} skipped, {} rejected) -> {}",
                report.records,
                report.years_with_data,
                report.years_skipped,
                report.rejected,
                report.artifact_key,
            );
            for (i, record) in report.sample.iter().enumerate() {
                info!(
                    "  {}. {} - {} vs {} ({}-{})",
                    i + 1,
                    record.match_date,
                    record.home_team_id,
                    record.away_team_id,
                    record.home_score,
                    record.away_score,
                );
            }
        }
    }

    info!("Done");
    Ok(())
}
