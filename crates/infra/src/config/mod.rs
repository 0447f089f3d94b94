//! Configuration loading
//!
//! Loads [`ClientConfig`](risma_domain::ClientConfig) from environment
//! variables, a `.env` file or a config file.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
