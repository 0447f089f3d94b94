//! Client composition root
//!
//! Builds every component from a [`ClientConfig`] and shares the single
//! [`CredentialStore`] between them.

use std::sync::Arc;

use risma_core::{
    CredentialStorage, CredentialStore, JobSubmitter, JobTracker, SearchBackend,
};
use risma_domain::{ClientConfig, Result};
use tracing::info;

use crate::api::{ApiCommands, AuthService, RequestGateway};
use crate::storage::credential_storage;

/// Fully wired client
pub struct ClientContext {
    pub config: ClientConfig,
    pub credentials: Arc<CredentialStore>,
    pub gateway: Arc<RequestGateway>,
    pub commands: Arc<ApiCommands>,
    pub auth: AuthService,
    pub submitter: JobSubmitter,
    pub tracker: JobTracker,
}

impl ClientContext {
    /// Wire the client with the credential backend selected in `config`.
    ///
    /// Nothing is read from storage yet; call
    /// [`AuthService::restore`] to resume a persisted session.
    ///
    /// # Errors
    /// `Config` for an invalid base URL, `Storage` if the keychain cannot be
    /// opened.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let storage = credential_storage(&config.credentials)?;
        Self::with_storage(config, storage)
    }

    /// Wire the client around an explicit storage backend
    ///
    /// # Errors
    /// `Config` for an invalid base URL.
    pub fn with_storage(config: ClientConfig, storage: Arc<dyn CredentialStorage>) -> Result<Self> {
        let credentials = Arc::new(CredentialStore::new(storage));
        let gateway = Arc::new(RequestGateway::new(&config.api, Arc::clone(&credentials))?);
        let commands = Arc::new(ApiCommands::new(Arc::clone(&gateway)));
        let backend: Arc<dyn SearchBackend> = commands.clone();

        let context = Self {
            auth: AuthService::new(Arc::clone(&gateway)),
            submitter: JobSubmitter::new(Arc::clone(&backend)),
            tracker: JobTracker::new(backend).with_polling(config.polling.clone()),
            credentials,
            gateway,
            commands,
            config,
        };

        info!(base_url = %context.config.api.base_url, "Risma client initialized");
        Ok(context)
    }
}

impl std::fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientContext")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
