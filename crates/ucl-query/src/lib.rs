//! UCL Lake Query Library
//!
//! Submits SQL to the remote analytical engine and watches submitted jobs
//! to completion with a bounded polling loop. Every caller that needs
//! "submit, then poll until terminal" goes through [`engine::QueryEngine`]
//! instead of hand-rolling the loop; interval and attempt budget come from
//! [`config::QueryConfig`].
//!
//! The engine never cancels a remote job: exhausting the attempt budget
//! yields [`job::QueryOutcome::TimedOut`] and simply stops observing.

pub mod athena;
pub mod config;
pub mod engine;
pub mod job;

pub use athena::AthenaService;
pub use config::QueryConfig;
pub use engine::{QueryEngine, QueryError, QueryService};
pub use job::{QueryJob, QueryOutcome, QueryState};
