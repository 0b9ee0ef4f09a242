//! Query job state machine.

use serde::{Deserialize, Serialize};

/// Execution state of a submitted query.
///
/// The first five are reported by the remote engine; `TimedOut` is assigned
/// locally when the polling budget runs out before a terminal state shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Submitted,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    TimedOut,
}

impl QueryState {
    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryState::Succeeded
                | QueryState::Failed
                | QueryState::Cancelled
                | QueryState::TimedOut
        )
    }
}

impl std::fmt::Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueryState::Submitted => "SUBMITTED",
            QueryState::Running => "RUNNING",
            QueryState::Succeeded => "SUCCEEDED",
            QueryState::Failed => "FAILED",
            QueryState::Cancelled => "CANCELLED",
            QueryState::TimedOut => "TIMED_OUT",
        };
        write!(f, "{}", s)
    }
}

/// One submitted query, tracked from submission to a terminal observation.
#[derive(Debug, Clone)]
pub struct QueryJob {
    /// Opaque id assigned by the remote engine at submission.
    pub id: String,
    pub query_text: String,
    pub catalog: String,
    pub result_location: String,
    state: QueryState,
    failure_reason: Option<String>,
}

impl QueryJob {
    pub fn new(
        id: impl Into<String>,
        query_text: impl Into<String>,
        catalog: impl Into<String>,
        result_location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            query_text: query_text.into(),
            catalog: catalog.into(),
            result_location: result_location.into(),
            state: QueryState::Submitted,
            failure_reason: None,
        }
    }

    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Present only once a `Failed` state has been observed.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Record one observation from the polling loop.
    ///
    /// State moves only forward: a terminal state absorbs every later
    /// observation, and `Submitted` cannot be re-entered once the job has
    /// been seen running.
    pub fn observe(&mut self, next: QueryState, reason: Option<String>) {
        if self.state.is_terminal() {
            return;
        }
        if next == QueryState::Submitted && self.state != QueryState::Submitted {
            return;
        }
        self.state = next;
        if next == QueryState::Failed {
            self.failure_reason = reason;
        }
    }
}

/// Terminal result of awaiting a query, as the caller sees it.
///
/// `TimedOut` is deliberately distinct from `Failed`: the remote job may
/// still be running; this process just stopped watching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Succeeded,
    Failed { reason: String },
    Cancelled,
    TimedOut,
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Succeeded)
    }
}

impl std::fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryOutcome::Succeeded => write!(f, "SUCCEEDED"),
            QueryOutcome::Failed { reason } => write!(f, "FAILED: {}", reason),
            QueryOutcome::Cancelled => write!(f, "CANCELLED"),
            QueryOutcome::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}
