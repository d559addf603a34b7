//! Authenticated HTTP access to the collection API.
//!
//! Every call attaches the basic-auth credentials read at startup and accepts
//! the master server's self-signed certificate. There is no retry: a GET
//! failure is fatal to the run (downstream selection needs a complete data
//! set), while a PUT failure is reported to the caller and isolated to that
//! one archive.

use serde::de::DeserializeOwned;
use url::Url;

/// Failure classes for API calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base URL {0:?}: {1}")]
    BaseUrl(String, url::ParseError),

    #[error("invalid request path {0:?}: {1}")]
    Path(String, url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Build(reqwest::Error),

    #[error("{method} {path} failed: {source}")]
    Transport {
        method: &'static str,
        path: String,
        source: reqwest::Error,
    },

    #[error("{method} {path} returned status {status}")]
    Status {
        method: &'static str,
        path: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        source: reqwest::Error,
    },
}

/// HTTP client bound to one master server and one set of credentials.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    username: String,
    password: String,
}

impl ApiClient {
    /// Build a client for the given master server.
    ///
    /// Invalid TLS certificates are accepted: these servers routinely present
    /// self-signed certificates and trusting them is an explicit operator
    /// decision, not a default.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::BaseUrl(base_url.to_string(), e))?;
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url,
            username: username.into(),
            password: password.into(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::Path(path.to_string(), e))
    }

    /// GET a resource and decode its JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .get(url)
            .query(query)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                method: "GET",
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                method: "GET",
                path: path.to_string(),
                status,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ClientError::Decode {
                path: path.to_string(),
                source,
            })
    }

    /// PUT a JSON body to a resource. Non-2xx is a failure.
    pub async fn put_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &serde_json::Value,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .put(url)
            .query(query)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                method: "PUT",
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                method: "PUT",
                path: path.to_string(),
                status,
            });
        }

        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Credentials stay out of debug output.
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
