//! Session credential state and its persistence port

pub mod storage;
pub mod store;

pub use storage::{CredentialStorage, InMemoryCredentialStorage};
pub use store::{CredentialSnapshot, CredentialStore};
