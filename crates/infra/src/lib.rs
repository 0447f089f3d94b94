//! # Risma Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The authenticated request gateway and typed API commands
//! - Keychain-backed credential storage
//! - Configuration loading and logging setup
//! - [`ClientContext`], which wires everything together
//!
//! ## Architecture
//! - Implements traits defined in `risma-core`
//! - Depends on `risma-domain` and `risma-core`
//! - Contains all "impure" code (HTTP, keychain, filesystem)

pub mod api;
pub mod config;
pub mod context;
pub mod errors;
pub mod http;
pub mod observability;
pub mod storage;

// Re-export commonly used items
pub use api::{ApiCommands, AuthService, GatewayRequest, GatewayResponse, RequestGateway};
pub use context::ClientContext;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::{init_tracing, LogFormat};
pub use storage::{credential_storage, KeychainCredentialStorage};
