//! Athena-backed query service.

use crate::engine::{QueryError, QueryService, Result};
use crate::job::QueryState;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_athena::types::{QueryExecutionContext, QueryExecutionState, ResultConfiguration};
use aws_sdk_athena::Client;
use tracing::debug;

pub struct AthenaService {
    client: Client,
}

impl AthenaService {
    /// Build a client from the ambient AWS credential chain.
    pub async fn from_env(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        Self {
            client: Client::new(&config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueryService for AthenaService {
    async fn start_query(
        &self,
        query: &str,
        catalog: &str,
        result_location: &str,
    ) -> Result<String> {
        let context = QueryExecutionContext::builder().database(catalog).build();
        let result_config = ResultConfiguration::builder()
            .output_location(result_location)
            .build();

        let response = self
            .client
            .start_query_execution()
            .query_string(query)
            .query_execution_context(context)
            .result_configuration(result_config)
            .send()
            .await
            .map_err(|e| QueryError::Submit(e.to_string()))?;

        response
            .query_execution_id()
            .map(|id| id.to_string())
            .ok_or(QueryError::MissingJobId)
    }

    async fn query_state(&self, id: &str) -> Result<(QueryState, Option<String>)> {
        let response = self
            .client
            .get_query_execution()
            .query_execution_id(id)
            .send()
            .await
            .map_err(|e| QueryError::Poll(e.to_string()))?;

        let status = response
            .query_execution()
            .and_then(|execution| execution.status())
            .ok_or_else(|| QueryError::Poll(format!("No status returned for job {}", id)))?;

        let state = match status.state() {
            Some(QueryExecutionState::Queued) => QueryState::Submitted,
            Some(QueryExecutionState::Running) => QueryState::Running,
            Some(QueryExecutionState::Succeeded) => QueryState::Succeeded,
            Some(QueryExecutionState::Failed) => QueryState::Failed,
            Some(QueryExecutionState::Cancelled) => QueryState::Cancelled,
            // Unknown or absent state: keep polling until the budget runs out.
            _ => QueryState::Running,
        };

        let reason = status.state_change_reason().map(|s| s.to_string());

        debug!(job_id = id, state = %state, "Polled query state");

        Ok((state, reason))
    }
}
