//! Process-wide credential state
//!
//! `CredentialStore` is the only shared mutable state in the client. It is
//! written by login, by the gateway's refresh path and by logout; everything
//! else reads it. Each write bumps a generation counter so concurrent
//! refreshes can tell whether the credential they started from is still
//! current.

use std::sync::Arc;

use parking_lot::RwLock;
use risma_domain::Credential;
use tracing::{debug, info, warn};

use super::storage::{CredentialStorage, InMemoryCredentialStorage};

/// Credential pair together with the generation it was written at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSnapshot {
    pub generation: u64,
    pub credential: Option<Credential>,
}

#[derive(Debug, Default)]
struct CredentialState {
    credential: Option<Credential>,
    generation: u64,
}

/// Holder of the current access/refresh pair.
///
/// The pair is replaced as a whole under a single write lock, so readers
/// never see an access token from one pair with the refresh token of another.
/// Writes go through to [`CredentialStorage`]; a failing backend is logged
/// and does not fail the in-memory update.
pub struct CredentialStore {
    state: RwLock<CredentialState>,
    storage: Arc<dyn CredentialStorage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn CredentialStorage>) -> Self {
        Self { state: RwLock::new(CredentialState::default()), storage }
    }

    /// Store backed by process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCredentialStorage::new()))
    }

    /// Initialize from durable storage. Returns whether a pair was restored.
    pub fn load(&self) -> bool {
        let restored = match self.storage.load() {
            Ok(restored) => restored,
            Err(err) => {
                warn!(error = %err, "Failed to read persisted credential");
                None
            }
        };

        let Some(credential) = restored else {
            debug!("No persisted credential found");
            return false;
        };

        let mut state = self.state.write();
        state.credential = Some(credential);
        state.generation += 1;
        info!(generation = state.generation, "Restored persisted credential");
        true
    }

    /// Replace the current pair.
    pub fn set(&self, access_token: impl Into<String>, refresh_token: Option<String>) {
        self.set_credential(Credential::new(access_token, refresh_token));
    }

    /// Replace the current pair with `credential`.
    pub fn set_credential(&self, credential: Credential) {
        let mut state = self.state.write();
        self.persist(Some(&credential));
        state.credential = Some(credential);
        state.generation += 1;
        debug!(generation = state.generation, "Credential replaced");
    }

    /// Replace the pair only if no other write happened since `generation`.
    ///
    /// Returns `false` (and writes nothing) when the store has moved on,
    /// e.g. a logout raced with a refresh.
    pub fn replace_if_generation(&self, generation: u64, credential: Credential) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            debug!(
                expected = generation,
                current = state.generation,
                "Credential changed during refresh; keeping newer value"
            );
            return false;
        }
        self.persist(Some(&credential));
        state.credential = Some(credential);
        state.generation += 1;
        true
    }

    /// Remove both tokens only if no other write happened since `generation`.
    pub fn clear_if_generation(&self, generation: u64) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        self.persist(None);
        state.credential = None;
        state.generation += 1;
        true
    }

    /// Remove both tokens.
    pub fn clear(&self) {
        let mut state = self.state.write();
        self.persist(None);
        state.credential = None;
        state.generation += 1;
        debug!(generation = state.generation, "Credential cleared");
    }

    /// Current access token, if any
    pub fn current(&self) -> Option<String> {
        self.state.read().credential.as_ref().map(|c| c.access_token.clone())
    }

    /// Current pair, if any
    pub fn credential(&self) -> Option<Credential> {
        self.state.read().credential.clone()
    }

    /// Pair and generation, read together
    pub fn snapshot(&self) -> CredentialSnapshot {
        let state = self.state.read();
        CredentialSnapshot { generation: state.generation, credential: state.credential.clone() }
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().credential.is_some()
    }

    // Called with the write lock held so storage sees writes in the same
    // order as memory.
    fn persist(&self, credential: Option<&Credential>) {
        let outcome = match credential {
            Some(credential) => self.storage.store(credential),
            None => self.storage.erase(),
        };
        if let Err(err) = outcome {
            warn!(error = %err, "Failed to persist credential change");
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CredentialStore")
            .field("authenticated", &state.credential.is_some())
            .field("generation", &state.generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use risma_domain::{ClientError, Result};

    use super::*;

    struct BrokenStorage;

    impl CredentialStorage for BrokenStorage {
        fn load(&self) -> Result<Option<Credential>> {
            Err(ClientError::Storage("keychain locked".into()))
        }

        fn store(&self, _credential: &Credential) -> Result<()> {
            Err(ClientError::Storage("keychain locked".into()))
        }

        fn erase(&self) -> Result<()> {
            Err(ClientError::Storage("keychain locked".into()))
        }
    }

    #[test]
    fn test_set_and_clear() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.current(), None);

        store.set("access-1", Some("refresh-1".into()));
        assert_eq!(store.current().as_deref(), Some("access-1"));
        assert!(store.is_authenticated());

        store.clear();
        assert_eq!(store.current(), None);
        assert_eq!(store.credential(), None);
    }

    #[test]
    fn test_every_write_bumps_generation() {
        let store = CredentialStore::in_memory();
        let g0 = store.generation();
        store.set("a", None);
        store.set("b", None);
        store.clear();
        assert_eq!(store.generation(), g0 + 3);
    }

    #[test]
    fn test_replace_if_generation_loses_to_newer_write() {
        let store = CredentialStore::in_memory();
        store.set("old", Some("r".into()));
        let seen = store.generation();

        store.clear();
        assert!(!store.replace_if_generation(seen, Credential::new("refreshed", None)));
        assert_eq!(store.current(), None);

        let seen = store.generation();
        assert!(store.replace_if_generation(seen, Credential::new("fresh", None)));
        assert_eq!(store.current().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_clear_if_generation() {
        let store = CredentialStore::in_memory();
        store.set("a", None);
        let seen = store.generation();

        store.set("b", None);
        assert!(!store.clear_if_generation(seen));
        assert_eq!(store.current().as_deref(), Some("b"));

        assert!(store.clear_if_generation(store.generation()));
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_writes_go_through_to_storage() {
        let storage = Arc::new(InMemoryCredentialStorage::new());
        let store = CredentialStore::new(storage.clone());

        store.set("access", Some("refresh".into()));
        assert_eq!(
            storage.load().unwrap(),
            Some(Credential::new("access", Some("refresh".into())))
        );

        store.clear();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_load_restores_persisted_pair() {
        let storage =
            Arc::new(InMemoryCredentialStorage::with_credential(Credential::new("saved", None)));
        let store = CredentialStore::new(storage);

        assert!(store.load());
        assert_eq!(store.current().as_deref(), Some("saved"));
    }

    #[test]
    fn test_storage_failures_do_not_fail_memory_updates() {
        let store = CredentialStore::new(Arc::new(BrokenStorage));
        assert!(!store.load());

        store.set("access", None);
        assert_eq!(store.current().as_deref(), Some("access"));

        store.clear();
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_readers_never_see_mixed_pairs() {
        let store = Arc::new(CredentialStore::in_memory());
        store.set("access-0", Some("refresh-0".into()));

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 1..500 {
                    store.set(format!("access-{i}"), Some(format!("refresh-{i}")));
                }
            })
        };

        for _ in 0..500 {
            if let Some(credential) = store.credential() {
                let access = credential.access_token.trim_start_matches("access-").to_string();
                let refresh = credential.refresh_token.unwrap_or_default();
                assert_eq!(refresh.trim_start_matches("refresh-"), access);
            }
        }

        writer.join().unwrap();
    }

    #[test]
    fn test_debug_does_not_print_tokens() {
        let store = CredentialStore::in_memory();
        store.set("very-secret", None);
        assert!(!format!("{store:?}").contains("very-secret"));
    }
}
