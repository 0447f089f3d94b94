//! # Risma Core
//!
//! Client-side coordination logic - no HTTP or platform dependencies.
//!
//! This crate contains:
//! - Credential state shared by every outbound call
//! - Port/adapter interfaces (traits)
//! - Search job submission and tracking
//!
//! ## Architecture Principles
//! - Only depends on `risma-domain`
//! - No HTTP, keychain or platform code
//! - All external dependencies via traits
//! - Pure, testable coordination logic

pub mod auth;
pub mod search;

// Re-export specific items to avoid ambiguity
pub use auth::{CredentialSnapshot, CredentialStorage, CredentialStore, InMemoryCredentialStorage};
pub use search::{JobSubmitter, JobTracker, PollSequence, SearchBackend};
