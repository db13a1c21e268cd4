//! Web search client backed by a hosted completion-style search API.
//!
//! One-shot request/response: no jobs, no polling. The client shares the
//! transport seam and secret injection used by the discovery client.

pub mod client;
pub mod types;

pub use client::{SearchClient, SearchError};
pub use types::{SearchAnswer, SearchRequest};
