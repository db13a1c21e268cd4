//! Agent definitions and the builder that registers them with the hosted
//! agent runtime.
//!
//! The crate has three layers: tool implementations wrapping the
//! discovery and search clients, declarative profiles (identity, model,
//! instructions), and the builder that assembles both into the runtime's
//! agent payload.

pub mod builder;
pub mod profiles;
pub mod specs;
pub mod tools;

pub use builder::{AgentBuilder, BuildError, BuildReport, DeleteOutcome};
pub use profiles::{profile, profile_names, AgentProfile, Instructions};
pub use specs::ToolSpec;
pub use tools::{Tool, ToolRegistry};
