//! Job service client.
//!
//! [`JobService`] is the seam between the orchestrator and the remote
//! batch-computation service: submit a batch, fetch its status, probe
//! liveness. [`api::JobServiceApi`] is the HTTP/JSON binding built on
//! [`reqwest`]. Status payloads are normalized into typed results here,
//! before they reach the merge step.

pub mod api;
pub mod error;
pub mod models;
pub mod service;

pub use api::JobServiceApi;
pub use error::JobServiceError;
pub use models::{SubmitAccepted, SubmitRequest};
pub use service::JobService;
