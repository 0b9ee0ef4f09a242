//! UCL Lake Common Library
//!
//! Shared infrastructure for the UCL Lake workspace members:
//!
//! - **Logging**: tracing subscriber setup (console/file, text/JSON)
//! - **Types**: endpoint kinds, partition keys, and the canonical match record
//! - **Storage**: the S3-backed content store both pipelines write to

pub mod logging;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use storage::{ContentStore, UploadResult};
pub use types::{EndpointKind, MatchRecord, PartitionKey};
