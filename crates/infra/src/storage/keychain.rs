//! Credential storage in the platform keychain
//!
//! The access and refresh tokens are kept as two entries of one keychain
//! service, under the fixed keys `token` and `refresh_token`.

use keyring::Entry;
use risma_core::CredentialStorage;
use risma_domain::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use risma_domain::{ClientError, Credential, Result};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// [`CredentialStorage`] backed by the platform keychain
pub struct KeychainCredentialStorage {
    service_name: String,
    access: Entry,
    refresh: Entry,
}

impl KeychainCredentialStorage {
    /// Open the entries for `service_name`
    ///
    /// # Errors
    /// Returns `ClientError::Storage` if the keychain rejects the entry names.
    pub fn new(service_name: impl Into<String>) -> Result<Self> {
        let service_name = service_name.into();
        let access = open_entry(&service_name, ACCESS_TOKEN_KEY)?;
        let refresh = open_entry(&service_name, REFRESH_TOKEN_KEY)?;
        Ok(Self { service_name, access, refresh })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}

fn open_entry(service: &str, key: &str) -> Result<Entry> {
    Entry::new(service, key).map_err(|e| ClientError::from(InfraError::from(e)))
}

fn read(entry: &Entry) -> Result<Option<String>> {
    match entry.get_password() {
        Ok(secret) => Ok(Some(secret)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(InfraError::from(e).into()),
    }
}

/// Delete an entry; a missing entry is already deleted.
fn remove(entry: &Entry) -> Result<()> {
    match entry.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(InfraError::from(e).into()),
    }
}

impl CredentialStorage for KeychainCredentialStorage {
    fn load(&self) -> Result<Option<Credential>> {
        let Some(access_token) = read(&self.access)? else {
            debug!(service = %self.service_name, "No access token in keychain");
            return Ok(None);
        };
        let refresh_token = read(&self.refresh)?;

        debug!(service = %self.service_name, "Credential read from keychain");
        Ok(Some(Credential::new(access_token, refresh_token)))
    }

    fn store(&self, credential: &Credential) -> Result<()> {
        self.access
            .set_password(&credential.access_token)
            .map_err(|e| ClientError::from(InfraError::from(e)))?;

        let refresh_written = match &credential.refresh_token {
            Some(refresh_token) => self
                .refresh
                .set_password(refresh_token)
                .map_err(|e| ClientError::from(InfraError::from(e))),
            None => remove(&self.refresh),
        };

        // Never leave a new access token next to a stale refresh token.
        if let Err(err) = refresh_written {
            warn!(
                service = %self.service_name,
                error = %err,
                "Refresh token write failed; erasing access token"
            );
            if let Err(cleanup) = remove(&self.access) {
                warn!(service = %self.service_name, error = %cleanup, "Could not erase access token");
            }
            return Err(err);
        }

        debug!(service = %self.service_name, "Credential stored in keychain");
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        remove(&self.access)?;
        remove(&self.refresh)?;

        debug!(service = %self.service_name, "Credential removed from keychain");
        Ok(())
    }
}

impl std::fmt::Debug for KeychainCredentialStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeychainCredentialStorage")
            .field("service_name", &self.service_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_storage() -> KeychainCredentialStorage {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeychainCredentialStorage::new("risma.test").unwrap()
    }

    #[test]
    fn test_empty_keychain_loads_nothing() {
        let storage = mock_storage();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_store_then_load() {
        let storage = mock_storage();
        let credential = Credential::new("access", Some("refresh".into()));

        storage.store(&credential).unwrap();
        assert_eq!(storage.load().unwrap(), Some(credential));
    }

    #[test]
    fn test_store_without_refresh_token_removes_old_one() {
        let storage = mock_storage();
        storage.store(&Credential::new("a1", Some("r1".into()))).unwrap();
        storage.store(&Credential::new("a2", None)).unwrap();

        assert_eq!(storage.load().unwrap(), Some(Credential::new("a2", None)));
    }

    #[test]
    fn test_failed_refresh_write_leaves_no_half_pair() {
        let storage = mock_storage();
        storage.store(&Credential::new("a1", Some("r1".into()))).unwrap();

        let mock = storage
            .refresh
            .get_credential()
            .downcast_ref::<keyring::mock::MockCredential>()
            .unwrap();
        mock.set_error(keyring::Error::Invalid("refresh_token".into(), "locked".into()));

        assert!(storage.store(&Credential::new("a2", Some("r2".into()))).is_err());
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_erase_is_idempotent() {
        let storage = mock_storage();
        storage.store(&Credential::new("a", Some("r".into()))).unwrap();

        storage.erase().unwrap();
        storage.erase().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }
}
