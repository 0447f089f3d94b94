//! # Risma Domain
//!
//! Domain types and models for the Risma search client.
//!
//! This crate contains:
//! - Domain data types (Credential, CompanyList, SearchJob, etc.)
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Domain constants and the industry catalog
//!
//! ## Architecture
//! - No dependencies on other Risma crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
