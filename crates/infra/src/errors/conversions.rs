//! Conversions from external infrastructure errors into domain errors.

use keyring::Error as KeyringError;
use reqwest::Error as HttpError;
use risma_domain::ClientError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ClientError);

impl From<InfraError> for ClientError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ClientError> for InfraError {
    fn from(value: ClientError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoClientError {
    fn into_client_error(self) -> ClientError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → ClientError */
/* -------------------------------------------------------------------------- */

impl IntoClientError for KeyringError {
    fn into_client_error(self) -> ClientError {
        use KeyringError::{Ambiguous, BadEncoding, NoEntry, NoStorageAccess, PlatformFailure};

        let description = self.to_string();

        match self {
            NoEntry => ClientError::Storage("keychain entry not found".into()),
            BadEncoding(_) => ClientError::Storage("credential in keychain is not valid UTF-8".into()),
            Ambiguous(entries) => ClientError::Storage(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            PlatformFailure(err) => ClientError::Storage(format!("keychain platform error: {err}")),
            NoStorageAccess(err) => {
                ClientError::Storage(format!("unable to access secure storage: {err}"))
            }
            _ => ClientError::Storage(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_client_error())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → ClientError */
/* -------------------------------------------------------------------------- */

impl IntoClientError for HttpError {
    fn into_client_error(self) -> ClientError {
        if self.is_timeout() {
            return ClientError::network("HTTP request timed out");
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return ClientError::network("HTTP connection failure");
        }

        if self.is_decode() {
            return ClientError::Decode(self.to_string());
        }

        if self.is_builder() {
            return ClientError::Config(format!("invalid HTTP request: {self}"));
        }

        ClientError::network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_client_error())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Client;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn keyring_no_entry_maps_to_storage_error() {
        let mapped: ClientError = InfraError::from(KeyringError::NoEntry).into();
        match mapped {
            ClientError::Storage(msg) => assert!(msg.contains("keychain")),
            other => panic!("expected storage error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_timeout_maps_to_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client =
            Client::builder().no_proxy().timeout(Duration::from_millis(50)).build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap_err();

        let mapped: ClientError = InfraError::from(error).into();
        assert!(matches!(mapped, ClientError::Network { ref message, step: None } if message.contains("timed out")));
    }
}
