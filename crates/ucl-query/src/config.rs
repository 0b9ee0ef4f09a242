use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

/// Settings for the query execution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Database (catalog) queries run against.
    pub database: String,

    /// S3 URI the engine writes result sets to.
    pub output_location: String,

    /// AWS region of the query engine.
    pub region: String,

    /// Seconds between status polls.
    pub poll_interval_secs: u64,

    /// Maximum number of status polls before giving up with TIMED_OUT.
    pub max_attempts: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            database: "ucl_analytics_db".to_string(),
            output_location: "s3://ucl-lake-2025/athena-query-results/".to_string(),
            region: "ap-southeast-1".to_string(),
            poll_interval_secs: 2,
            max_attempts: 60,
        }
    }
}

impl QueryConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            database: env::var("ATHENA_DATABASE").unwrap_or(defaults.database),
            output_location: env::var("ATHENA_OUTPUT_LOCATION")
                .unwrap_or(defaults.output_location),
            region: env::var("AWS_REGION").unwrap_or(defaults.region),
            poll_interval_secs: env_parsed("QUERY_POLL_INTERVAL_SECS", defaults.poll_interval_secs),
            max_attempts: env_parsed("QUERY_MAX_ATTEMPTS", defaults.max_attempts),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_attempts >= 1, "max_attempts must be at least 1");
        anyhow::ensure!(
            !self.output_location.is_empty(),
            "output_location cannot be empty"
        );
        anyhow::ensure!(!self.database.is_empty(), "database cannot be empty");
        Ok(())
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
