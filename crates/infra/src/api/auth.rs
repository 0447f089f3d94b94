//! Session management on top of the request gateway
//!
//! Login exchanges a username and password for a token pair; restore
//! revalidates a persisted pair on startup. Token refresh itself lives in the
//! gateway.

use std::sync::Arc;

use risma_core::CredentialStore;
use risma_domain::{ClientError, NewUser, Result, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::gateway::{GatewayRequest, RequestGateway};

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenPair {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Authentication service for the Risma API
pub struct AuthService {
    gateway: Arc<RequestGateway>,
}

impl AuthService {
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    fn store(&self) -> &CredentialStore {
        self.gateway.credentials()
    }

    /// Log in and return the authenticated user's profile.
    ///
    /// # Errors
    ///
    /// - `Validation` if `username` or `password` is blank (nothing is sent)
    /// - `Remote` with the service's status for rejected credentials
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
        if username.trim().is_empty() {
            return Err(ClientError::validation("username", "must not be empty"));
        }
        if password.is_empty() {
            return Err(ClientError::validation("password", "must not be empty"));
        }

        let request =
            GatewayRequest::post("/api/auth/login").json(&LoginRequest { username, password })?;
        let tokens: TokenPair = self.gateway.execute_public(&request).await?.json()?;

        self.store().set(tokens.access_token, tokens.refresh_token);
        let user = self.current_user().await?;

        info!(user_id = user.id, "Logged in");
        Ok(user)
    }

    /// Create an account. Does not log in and leaves the current credential
    /// untouched.
    ///
    /// # Errors
    ///
    /// - `Validation` if `email` or `password` is blank (nothing is sent)
    /// - `Remote` 400 if the email is already registered
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register(&self, new_user: &NewUser) -> Result<UserProfile> {
        if new_user.email.trim().is_empty() {
            return Err(ClientError::validation("email", "must not be empty"));
        }
        if new_user.password.is_empty() {
            return Err(ClientError::validation("password", "must not be empty"));
        }

        let request = GatewayRequest::post("/api/auth/register").json(new_user)?;
        let user: UserProfile = self.gateway.execute_public(&request).await?.json()?;

        info!(user_id = user.id, "Registered");
        Ok(user)
    }

    /// Profile of the user the current credential belongs to.
    ///
    /// # Errors
    ///
    /// `AuthExpired` if there is no usable credential.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<UserProfile> {
        if !self.store().is_authenticated() {
            return Err(ClientError::AuthExpired);
        }
        self.gateway.execute_json(&GatewayRequest::post("/api/auth/test-token")).await
    }

    /// Revalidate a persisted credential.
    ///
    /// Returns `Ok(None)` when nothing was persisted or the service rejected
    /// the credential (it is cleared). Transport failures keep the
    /// credential and are returned as errors.
    ///
    /// # Errors
    ///
    /// `Network` and non-auth `Remote` failures.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<UserProfile>> {
        if !self.store().load() {
            debug!("No session to restore");
            return Ok(None);
        }

        match self.current_user().await {
            Ok(user) => {
                info!(user_id = user.id, "Session restored");
                Ok(Some(user))
            }
            Err(ClientError::AuthExpired) => Ok(None),
            Err(ClientError::Remote { status: 401 | 403, .. }) => {
                warn!("Persisted credential rejected; clearing");
                self.store().clear();
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Forget the current credential, in memory and in storage.
    pub fn logout(&self) {
        self.store().clear();
        info!("Logged out");
    }

    pub fn is_authenticated(&self) -> bool {
        self.store().is_authenticated()
    }
}
