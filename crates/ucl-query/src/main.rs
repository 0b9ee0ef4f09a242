//! UCL Query - submit SQL to the analytical engine and await completion

use anyhow::{bail, Result};
use clap::{ArgGroup, Parser};
use tracing::info;
use ucl_common::logging::{init_logging, LogConfig, LogLevel};
use ucl_common::storage::StoreConfig;
use ucl_common::ContentStore;
use ucl_query::{AthenaService, QueryConfig, QueryEngine, QueryOutcome};

#[derive(Parser, Debug)]
#[command(name = "ucl-query")]
#[command(author, version, about = "Champions League analytics query runner")]
#[command(group(ArgGroup::new("source").required(true).args(["sql", "sql_key"])))]
struct Cli {
    /// Inline SQL to execute
    #[arg(long)]
    sql: Option<String>,

    /// Content-store key holding the SQL to execute
    #[arg(long)]
    sql_key: Option<String>,

    /// Override the target database
    #[arg(long)]
    database: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
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
            .with_file_prefix("ucl-query"),
    )?;
    init_logging(&log_config)?;

    let mut config = QueryConfig::from_env()?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    let service = AthenaService::from_env(&config.region).await;
    let engine = QueryEngine::new(service, config);

    let (job, outcome) = match (cli.sql, cli.sql_key) {
        (Some(sql), _) => engine.execute(&sql).await?,
        (None, Some(key)) => {
            let store = ContentStore::new(StoreConfig::from_env()?);
            engine.execute_stored(&store, &key).await?
        }
        (None, None) => unreachable!("clap enforces one SQL source"),
    };

    match outcome {
        QueryOutcome::Succeeded => {
            info!(job_id = %job.id, "Query completed successfully");
            Ok(())
        }
        QueryOutcome::Failed { reason } => bail!("Query {} failed: {}", job.id, reason),
        QueryOutcome::Cancelled => bail!("Query {} was cancelled", job.id),
        QueryOutcome::TimedOut => bail!(
            "Query {} did not finish within the polling budget (it may still be running)",
            job.id
        ),
    }
}
