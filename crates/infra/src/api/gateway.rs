//! Authenticated request gateway
//!
//! Every call to the remote service goes through [`RequestGateway`]. It
//! attaches the current bearer credential, and on a 401 joins (or starts) a
//! single-flight refresh for the credential generation the request was sent
//! with, then resends the request once.
//!
//! The refresh is a shared future kept in a slot keyed by generation, so any
//! number of concurrent 401s collapse into one call to the refresh endpoint.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use risma_core::{CredentialSnapshot, CredentialStore};
use risma_domain::{ApiConfig, ClientError, Credential, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::errors::InfraError;
use crate::http::HttpClient;

const REFRESH_PATH: &str = "/api/auth/refresh-token";

/// Outbound request description.
///
/// Requests are plain values and are never mutated by the gateway, so the
/// same request can be sent again after a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
}

impl GatewayRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attach a JSON body
    ///
    /// # Errors
    /// Returns `ClientError::Decode` if `body` cannot be represented as JSON.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::Decode(format!("Failed to serialize body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Buffered response from the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    status: u16,
    body: Vec<u8>,
}

impl GatewayResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.body
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body (204/205) decodes as `null`.
    ///
    /// # Errors
    /// Returns `ClientError::Decode` if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        if self.body.is_empty() {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                ClientError::Decode(format!(
                    "Empty response ({}), but the expected type cannot be built from no content",
                    self.status
                ))
            });
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| ClientError::Decode(format!("Failed to parse response: {e}")))
    }

    fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::remote(self.status, self.text()))
        }
    }
}

/// Result of a refresh, shared by every waiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshOutcome {
    Renewed,
    Expired,
}

type RefreshFuture = Shared<BoxFuture<'static, RefreshOutcome>>;

struct InflightRefresh {
    generation: u64,
    future: RefreshFuture,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Authenticated gateway to the remote service
pub struct RequestGateway {
    http: HttpClient,
    base_url: String,
    credentials: Arc<CredentialStore>,
    refresh: Mutex<Option<InflightRefresh>>,
}

impl RequestGateway {
    /// Create a gateway for `config.base_url` reading credentials from
    /// `credentials`.
    ///
    /// # Errors
    /// Returns `ClientError::Config` if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &ApiConfig, credentials: Arc<CredentialStore>) -> Result<Self> {
        Url::parse(&config.base_url).map_err(|e| {
            ClientError::Config(format!("Invalid API base URL '{}': {e}", config.base_url))
        })?;

        let mut builder = HttpClient::builder().timeout(config.timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
            refresh: Mutex::new(None),
        })
    }

    /// Credential store this gateway reads from
    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Send `request` with the current credential.
    ///
    /// A 401 triggers at most one refresh and one resend; the resent
    /// request's outcome is returned whatever its status.
    ///
    /// # Errors
    /// - `AuthExpired` if the credential could not be refreshed (it has
    ///   been cleared)
    /// - `Remote` for any non-2xx response
    /// - `Network` for transport failures, including timeouts
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: &GatewayRequest) -> Result<GatewayResponse> {
        let sent_with = self.credentials.snapshot();
        let response = self.dispatch(request, sent_with.credential.as_ref()).await?;

        if response.status != StatusCode::UNAUTHORIZED.as_u16() {
            return response.into_result();
        }

        debug!(generation = sent_with.generation, "Request unauthorized");
        if self.refresh_after_unauthorized(sent_with).await == RefreshOutcome::Expired {
            return Err(ClientError::AuthExpired);
        }

        let Some(credential) = self.credentials.credential() else {
            return Err(ClientError::AuthExpired);
        };
        debug!("Resending request with renewed credential");
        self.dispatch(request, Some(&credential)).await?.into_result()
    }

    /// Send `request` without a credential and without the refresh path.
    /// Used for login.
    ///
    /// # Errors
    /// `Remote` for any non-2xx response, `Network` for transport failures.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute_public(&self, request: &GatewayRequest) -> Result<GatewayResponse> {
        self.dispatch(request, None).await?.into_result()
    }

    /// Send `request` and decode a JSON response
    ///
    /// # Errors
    /// As [`execute`](Self::execute), plus `Decode` for unexpected bodies.
    pub async fn execute_json<T: DeserializeOwned>(&self, request: &GatewayRequest) -> Result<T> {
        self.execute(request).await?.json()
    }

    /// `GET path` returning JSON
    ///
    /// # Errors
    /// As [`execute_json`](Self::execute_json).
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute_json(&GatewayRequest::get(path)).await
    }

    /// `POST path` with a JSON body, returning JSON
    ///
    /// # Errors
    /// As [`execute_json`](Self::execute_json).
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute_json(&GatewayRequest::post(path).json(body)?).await
    }

    /// `PUT path` with a JSON body, returning JSON
    ///
    /// # Errors
    /// As [`execute_json`](Self::execute_json).
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute_json(&GatewayRequest::put(path).json(body)?).await
    }

    /// `DELETE path`, ignoring any response body
    ///
    /// # Errors
    /// As [`execute`](Self::execute).
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.execute(&GatewayRequest::delete(path)).await.map(|_| ())
    }

    /// `GET path` returning the raw body
    ///
    /// # Errors
    /// As [`execute`](Self::execute).
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.execute(&GatewayRequest::get(path)).await.map(GatewayResponse::into_bytes)
    }

    async fn dispatch(
        &self,
        request: &GatewayRequest,
        credential: Option<&Credential>,
    ) -> Result<GatewayResponse> {
        let url = self.url_for(request)?;
        let mut builder = self.http.request(request.method.clone(), url);

        if let Some(credential) = credential {
            builder = builder.header(AUTHORIZATION, credential.bearer());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = self.http.send(builder).await?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| ClientError::from(InfraError::from(e)))?;

        Ok(GatewayResponse { status, body: body.to_vec() })
    }

    fn url_for(&self, request: &GatewayRequest) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, request.path))
            .map_err(|e| ClientError::Config(format!("Invalid request path '{}': {e}", request.path)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    /// Resolve a 401 for a request sent at `sent_with.generation`.
    ///
    /// If the store has moved on since the request was sent, the newer
    /// credential is used without refreshing. Otherwise the caller joins the
    /// refresh in flight for that generation, or starts it.
    async fn refresh_after_unauthorized(&self, sent_with: CredentialSnapshot) -> RefreshOutcome {
        let future = {
            let mut slot = self.refresh.lock();
            let current = self.credentials.snapshot();

            if current.generation != sent_with.generation {
                debug!(
                    sent = sent_with.generation,
                    current = current.generation,
                    "Credential changed since request was sent"
                );
                return if current.credential.is_some() {
                    RefreshOutcome::Renewed
                } else {
                    RefreshOutcome::Expired
                };
            }

            if current.credential.is_none() {
                return RefreshOutcome::Expired;
            }

            match slot.as_ref() {
                Some(inflight) if inflight.generation == current.generation => {
                    debug!(generation = current.generation, "Joining token refresh in flight");
                    inflight.future.clone()
                }
                _ => {
                    let generation = current.generation;
                    let future = self.start_refresh(current);
                    *slot = Some(InflightRefresh { generation, future: future.clone() });
                    future
                }
            }
        };

        future.await
    }

    fn start_refresh(&self, from: CredentialSnapshot) -> RefreshFuture {
        let http = self.http.clone();
        let url = format!("{}{REFRESH_PATH}", self.base_url);
        let store = Arc::clone(&self.credentials);
        let generation = from.generation;
        let refresh_token = from.credential.and_then(|c| c.refresh_token);

        async move {
            let Some(refresh_token) = refresh_token else {
                warn!("Access token rejected and no refresh token available; clearing credential");
                return expire(&store, generation);
            };

            match request_refresh(&http, &url, &refresh_token).await {
                Ok(tokens) => {
                    let credential = Credential::new(
                        tokens.access_token,
                        tokens.refresh_token.or(Some(refresh_token)),
                    );
                    if store.replace_if_generation(generation, credential) {
                        info!("Access token refreshed");
                        RefreshOutcome::Renewed
                    } else if store.is_authenticated() {
                        RefreshOutcome::Renewed
                    } else {
                        RefreshOutcome::Expired
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Token refresh failed; clearing credential");
                    expire(&store, generation)
                }
            }
        }
        .boxed()
        .shared()
    }
}

fn expire(store: &CredentialStore, generation: u64) -> RefreshOutcome {
    // A login that landed during the refresh wins over the failed refresh.
    if !store.clear_if_generation(generation) && store.is_authenticated() {
        RefreshOutcome::Renewed
    } else {
        RefreshOutcome::Expired
    }
}

async fn request_refresh(
    http: &HttpClient,
    url: &str,
    refresh_token: &str,
) -> Result<RefreshResponse> {
    let builder = http.request(Method::POST, url).json(&RefreshRequest { refresh_token });
    let response = http.send(builder).await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::remote(status.as_u16(), body));
    }

    response.json().await.map_err(|e| ClientError::from(InfraError::from(e)))
}

impl std::fmt::Debug for RequestGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGateway")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
