//! Durable credential storage backends

pub mod keychain;

use std::sync::Arc;

use risma_core::{CredentialStorage, InMemoryCredentialStorage};
use risma_domain::{CredentialBackend, CredentialConfig, Result};

pub use keychain::KeychainCredentialStorage;

/// Build the storage backend selected by `config`.
///
/// # Errors
/// Returns `ClientError::Storage` if the keychain cannot be opened.
pub fn credential_storage(config: &CredentialConfig) -> Result<Arc<dyn CredentialStorage>> {
    match config.backend {
        CredentialBackend::Keychain => {
            Ok(Arc::new(KeychainCredentialStorage::new(&config.keychain_service)?))
        }
        CredentialBackend::Memory => Ok(Arc::new(InMemoryCredentialStorage::new())),
    }
}
