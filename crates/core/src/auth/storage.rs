//! Port for durable credential persistence

use parking_lot::Mutex;
use risma_domain::{Credential, Result};

/// Durable storage for the credential pair.
///
/// Implementations keep the access and refresh tokens under fixed keys
/// (`token` and `refresh_token`). Calls are synchronous; the OS keychain
/// APIs behind them are.
pub trait CredentialStorage: Send + Sync {
    /// Load the persisted pair, if any
    ///
    /// # Errors
    /// Returns `ClientError::Storage` if the backend cannot be read.
    fn load(&self) -> Result<Option<Credential>>;

    /// Persist the pair, replacing whatever was stored.
    /// A missing refresh token removes the stored one.
    ///
    /// # Errors
    /// Returns `ClientError::Storage` if the backend rejects the write.
    fn store(&self, credential: &Credential) -> Result<()>;

    /// Remove both tokens. Erasing an empty store is not an error.
    ///
    /// # Errors
    /// Returns `ClientError::Storage` if the backend rejects the delete.
    fn erase(&self) -> Result<()>;
}

/// Process-local storage; nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStorage {
    slot: Mutex<Option<Credential>>,
}

impl InMemoryCredentialStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pair already persisted, as after a previous run.
    pub fn with_credential(credential: Credential) -> Self {
        Self { slot: Mutex::new(Some(credential)) }
    }
}

impl CredentialStorage for InMemoryCredentialStorage {
    fn load(&self) -> Result<Option<Credential>> {
        Ok(self.slot.lock().clone())
    }

    fn store(&self, credential: &Credential) -> Result<()> {
        *self.slot.lock() = Some(credential.clone());
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}
