//! Shared plumbing for the Prospector toolkit.
//!
//! Everything the client crates have in common lives here:
//! - `config` - layered TOML/env configuration with validation
//! - `secrets` - explicit secret injection (never ambient state)
//! - `http` - the transport seam every remote client is built on
//! - `envelope` - the uniform success/failure shape tools hand back
//!   to the orchestration layer

pub mod config;
pub mod envelope;
pub mod http;
pub mod secrets;

pub use envelope::ToolEnvelope;
pub use http::{ApiRequest, ApiResponse, HttpTransport, Method, ReqwestTransport, TransportError};
pub use secrets::{EnvSecretProvider, SecretError, SecretProvider, StaticSecretProvider};
