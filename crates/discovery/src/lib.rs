//! Async job lifecycle client for the hosted entity-discovery service.
//!
//! A discovery run is a long-running, server-owned computation: the
//! client creates it, polls its status, and retrieves results once the
//! run stops being active. Supplementary operations (extend, enrich,
//! cancel) act on an already-created run by its opaque id.
//!
//! The client caches nothing between calls. Every operation is addressed
//! purely by run id, so driving several runs concurrently through one
//! shared client needs no locking. No operation is retried automatically;
//! every failure surfaces immediately to the caller.

pub mod client;
pub mod ops;
pub mod types;

pub use client::{DiscoveryClient, DiscoveryError, WaitOptions};
pub use types::{
    Cancellation, Candidate, CreateRunRequest, EnrichmentSet, ExtendedRun, Generator, MatchCondition,
    MatchStatus, Processor, ResultSet, RunHandle, RunStatus, StatusSnapshot,
};
