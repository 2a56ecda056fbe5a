//! Collector orchestrator, keyset query engine, and status surface: the
//! operations that drive a configured provider and read back what it
//! persisted.

pub mod collector;
pub mod query;
pub mod status;

pub use collector::{collect, CollectAuth, CollectReport, CollectRequest};
pub use query::{query, QueryPage, QueryRequest};
pub use status::{status, CursorSnapshot, JobSnapshot, StatusRequest, StatusSnapshot};
