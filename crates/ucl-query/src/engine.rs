//! Query submission and bounded polling.

use crate::config::QueryConfig;
use crate::job::{QueryJob, QueryOutcome, QueryState};
use anyhow::Context;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use ucl_common::ContentStore;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, QueryError>;

/// Error types for query submission and polling.
///
/// These cover the conversation with the engine itself. A query that the
/// engine accepts and then reports as failed is NOT an error here; that is a
/// [`QueryOutcome::Failed`], surfaced to the caller to act on.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Query submission failed: {0}")]
    Submit(String),

    #[error("Status poll failed: {0}")]
    Poll(String),

    #[error("Engine returned no job id")]
    MissingJobId,
}

/// The remote analytical engine, reduced to the two calls the polling loop
/// needs. Production uses [`crate::athena::AthenaService`]; tests substitute
/// a scripted mock.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submit a query; returns the engine-assigned execution id.
    async fn start_query(
        &self,
        query: &str,
        catalog: &str,
        result_location: &str,
    ) -> Result<String>;

    /// One status observation, with the engine's failure reason when present.
    async fn query_state(&self, id: &str) -> Result<(QueryState, Option<String>)>;
}

/// Submits queries and watches them to a terminal state.
///
/// Poll interval and attempt budget come from [`QueryConfig`]; callers never
/// pick them per call site.
pub struct QueryEngine<S: QueryService> {
    service: S,
    config: QueryConfig,
}

impl<S: QueryService> QueryEngine<S> {
    pub fn new(service: S, config: QueryConfig) -> Self {
        Self { service, config }
    }

    /// Submit a query and return the tracked job.
    #[instrument(skip(self, query))]
    pub async fn submit(&self, query: &str) -> Result<QueryJob> {
        let id = self
            .service
            .start_query(query, &self.config.database, &self.config.output_location)
            .await?;

        info!(job_id = %id, "Query submitted");

        Ok(QueryJob::new(
            id,
            query,
            &self.config.database,
            &self.config.output_location,
        ))
    }

    /// Poll the job every `poll_interval_secs` until a terminal state shows
    /// up or `max_attempts` polls have been spent.
    ///
    /// Exhausting the budget yields [`QueryOutcome::TimedOut`] without
    /// cancelling the remote job; whether a timeout is fatal is the caller's
    /// decision, not this loop's.
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    pub async fn await_completion(&self, job: &mut QueryJob) -> Result<QueryOutcome> {
        let interval = Duration::from_secs(self.config.poll_interval_secs);

        for attempt in 1..=self.config.max_attempts {
            let (state, reason) = self.service.query_state(&job.id).await?;
            job.observe(state, reason.clone());

            match state {
                QueryState::Succeeded => {
                    info!(attempt, "Query succeeded");
                    return Ok(QueryOutcome::Succeeded);
                }
                QueryState::Failed => {
                    let reason = reason.unwrap_or_else(|| "Unknown error".to_string());
                    error!(attempt, reason = %reason, "Query failed");
                    return Ok(QueryOutcome::Failed { reason });
                }
                QueryState::Cancelled => {
                    warn!(attempt, "Query was cancelled");
                    return Ok(QueryOutcome::Cancelled);
                }
                _ => {
                    debug!(attempt, state = %state, "Query still in flight");
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(interval).await;
                    }
                }
            }
        }

        // Budget exhausted: stop observing. The remote job is left running.
        job.observe(QueryState::TimedOut, None);
        warn!(
            attempts = self.config.max_attempts,
            "Query did not reach a terminal state within the polling budget"
        );
        Ok(QueryOutcome::TimedOut)
    }

    /// Submit and await in one step.
    pub async fn execute(&self, query: &str) -> Result<(QueryJob, QueryOutcome)> {
        let mut job = self.submit(query).await?;
        let outcome = self.await_completion(&mut job).await?;
        Ok((job, outcome))
    }

    /// Read SQL text from the content store and execute it.
    pub async fn execute_stored(
        &self,
        store: &ContentStore,
        key: &str,
    ) -> anyhow::Result<(QueryJob, QueryOutcome)> {
        let bytes = store.get(key).await?;
        let sql = String::from_utf8(bytes)
            .context(format!("Stored query is not UTF-8: {}", key))?
            .trim()
            .to_string();
        anyhow::ensure!(!sql.is_empty(), "Stored query is empty: {}", key);

        info!(key, chars = sql.len(), "Loaded SQL from content store");

        Ok(self.execute(&sql).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted service: serves a fixed sequence of states, then repeats the
    /// last one. Counts every status call.
    struct ScriptedService {
        states: Vec<(QueryState, Option<String>)>,
        polls: AtomicUsize,
    }

    impl ScriptedService {
        fn new(states: Vec<(QueryState, Option<String>)>) -> Self {
            Self {
                states,
                polls: AtomicUsize::new(0),
            }
        }

        fn poll_count(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryService for ScriptedService {
        async fn start_query(
            &self,
            _query: &str,
            _catalog: &str,
            _result_location: &str,
        ) -> Result<String> {
            Ok("q-test".to_string())
        }

        async fn query_state(&self, _id: &str) -> Result<(QueryState, Option<String>)> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            let idx = n.min(self.states.len() - 1);
            Ok(self.states[idx].clone())
        }
    }

    fn fast_config(max_attempts: u32) -> QueryConfig {
        QueryConfig {
            poll_interval_secs: 0,
            max_attempts,
            ..QueryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_exactly_four_polls() {
        let service = ScriptedService::new(vec![
            (QueryState::Running, None),
            (QueryState::Running, None),
            (QueryState::Running, None),
            (QueryState::Succeeded, None),
        ]);
        let engine = QueryEngine::new(service, fast_config(10));

        let (job, outcome) = engine.execute("SELECT 1").await.unwrap();

        assert_eq!(outcome, QueryOutcome::Succeeded);
        assert_eq!(job.state(), QueryState::Succeeded);
        assert_eq!(engine.service.poll_count(), 4);
    }

    #[tokio::test]
    async fn test_times_out_after_exactly_max_attempts() {
        let service = ScriptedService::new(vec![(QueryState::Running, None)]);
        let engine = QueryEngine::new(service, fast_config(5));

        let (job, outcome) = engine.execute("SELECT 1").await.unwrap();

        assert_eq!(outcome, QueryOutcome::TimedOut);
        assert_eq!(job.state(), QueryState::TimedOut);
        assert_eq!(engine.service.poll_count(), 5);
    }

    #[tokio::test]
    async fn test_failure_carries_engine_reason() {
        let service = ScriptedService::new(vec![
            (QueryState::Running, None),
            (
                QueryState::Failed,
                Some("SYNTAX_ERROR: line 1:8".to_string()),
            ),
        ]);
        let engine = QueryEngine::new(service, fast_config(10));

        let (job, outcome) = engine.execute("SELEC 1").await.unwrap();

        assert_eq!(
            outcome,
            QueryOutcome::Failed {
                reason: "SYNTAX_ERROR: line 1:8".to_string()
            }
        );
        assert_eq!(job.failure_reason(), Some("SYNTAX_ERROR: line 1:8"));
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately() {
        let service = ScriptedService::new(vec![(QueryState::Cancelled, None)]);
        let engine = QueryEngine::new(service, fast_config(10));

        let (_, outcome) = engine.execute("SELECT 1").await.unwrap();

        assert_eq!(outcome, QueryOutcome::Cancelled);
        assert_eq!(engine.service.poll_count(), 1);
    }

    #[tokio::test]
    async fn test_queued_then_running_then_success() {
        let service = ScriptedService::new(vec![
            (QueryState::Submitted, None),
            (QueryState::Running, None),
            (QueryState::Succeeded, None),
        ]);
        let engine = QueryEngine::new(service, fast_config(10));

        let (job, outcome) = engine.execute("SELECT 1").await.unwrap();

        assert_eq!(outcome, QueryOutcome::Succeeded);
        assert_eq!(job.state(), QueryState::Succeeded);
        assert_eq!(engine.service.poll_count(), 3);
    }
}
