//! Main DataClient

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::api::ModelClient;
use crate::error::ApiError;
use crate::error::ConfigError;
use crate::error::Error;
use crate::model::EntityKind;

/// Default page size requested from list queries.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Credential attached to every data API request.
#[derive(Clone, PartialEq, Eq)]
pub enum DataAuth {
    /// Public API key, sent as `x-api-key`.
    ApiKey(String),
    /// User pool or OIDC token, sent as `Authorization`.
    Token(String),
}

impl std::fmt::Debug for DataAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataAuth::ApiKey(_) => f.write_str("ApiKey(***)"),
            DataAuth::Token(_) => f.write_str("Token(***)"),
        }
    }
}

/// The client for the managed GraphQL data API.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across threads safely. It is constructed explicitly and handed to each
/// table; there is no process-wide instance.
///
/// # Example
///
/// ```ignore
/// use cms_lib::{DataAuth, DataClient};
/// use cms_lib::model::EntityKind;
///
/// let client = DataClient::builder()
///     .url("https://abc.appsync-api.eu-west-1.amazonaws.com/graphql")
///     .auth(DataAuth::ApiKey("da2-...".into()))
///     .build()?;
///
/// let tags = client.model(EntityKind::Tag);
/// ```
#[derive(Clone)]
pub struct DataClient {
    pub(crate) inner: Arc<DataClientInner>,
}

pub(crate) struct DataClientInner {
    pub(crate) url: Url,
    pub(crate) auth: DataAuth,
    pub(crate) http_client: Client,
    pub(crate) timeout: Option<Duration>,
    pub(crate) list_limit: u32,
}

impl DataClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> DataClientBuilder<Missing, Missing> {
        DataClientBuilder::new()
    }

    /// Builds a client from the backend's `amplify_outputs.json`.
    ///
    /// Uses the `data.url` endpoint and `data.api_key` credential.
    pub fn from_outputs(path: impl AsRef<Path>) -> Result<DataClient, Error> {
        Self::from_backend_outputs(BackendOutputs::load(path)?)
    }

    /// Builds a client from already parsed backend outputs.
    pub fn from_backend_outputs(outputs: BackendOutputs) -> Result<DataClient, Error> {
        let data = outputs.data.ok_or(ConfigError::MissingDataSection)?;
        let api_key = data.api_key.ok_or_else(|| ConfigError::MissingApiKey {
            authorization: data
                .default_authorization_type
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        })?;

        DataClient::builder()
            .url(data.url)
            .auth(DataAuth::ApiKey(api_key))
            .build()
    }

    /// Returns a handle bound to one entity's CRUD operations.
    pub fn model(&self, entity: EntityKind) -> ModelClient {
        ModelClient::new(self.clone(), entity)
    }

    /// Returns the GraphQL endpoint.
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Returns the page size used by list queries.
    pub fn list_limit(&self) -> u32 {
        self.inner.list_limit
    }
}

// =============================================================================
// Backend outputs file
// =============================================================================

/// The subset of `amplify_outputs.json` this client reads.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendOutputs {
    /// Data API section, absent when no data backend is deployed.
    pub data: Option<DataOutputs>,
}

/// Data API section of the outputs file.
#[derive(Debug, Clone, Deserialize)]
pub struct DataOutputs {
    /// GraphQL endpoint.
    pub url: String,
    /// Public API key, present when API-key auth is enabled.
    pub api_key: Option<String>,
    /// Deployment region.
    pub aws_region: Option<String>,
    /// Default authorization mode, e.g. `API_KEY`.
    pub default_authorization_type: Option<String>,
}

impl BackendOutputs {
    /// Reads and parses an outputs file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::parse(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`DataClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The GraphQL endpoint
/// - `auth` - A [`DataAuth`] credential
pub struct DataClientBuilder<U, A> {
    url: U,
    auth: A,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
    list_limit: u32,
}

impl DataClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            auth: Missing,
            timeout: None,
            connect_timeout: None,
            http_client: None,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl Default for DataClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> DataClientBuilder<Missing, A> {
    /// Sets the GraphQL endpoint.
    pub fn url(self, url: impl Into<String>) -> DataClientBuilder<Set<String>, A> {
        DataClientBuilder {
            url: Set(url.into()),
            auth: self.auth,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            list_limit: self.list_limit,
        }
    }
}

impl<U> DataClientBuilder<U, Missing> {
    /// Sets the request credential.
    pub fn auth(self, auth: DataAuth) -> DataClientBuilder<U, Set<DataAuth>> {
        DataClientBuilder {
            url: self.url,
            auth: Set(auth),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            list_limit: self.list_limit,
        }
    }
}

impl<U, A> DataClientBuilder<U, A> {
    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the page size requested by list queries.
    ///
    /// Defaults to [`DEFAULT_LIST_LIMIT`]. Zero is raised to one.
    pub fn list_limit(mut self, limit: u32) -> Self {
        self.list_limit = limit.max(1);
        self
    }
}

impl DataClientBuilder<Set<String>, Set<DataAuth>> {
    /// Builds the [`DataClient`].
    ///
    /// This method is only available when both `url` and `auth` have been set.
    pub fn build(self) -> Result<DataClient, Error> {
        let url = Url::parse(&self.url.0).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", self.url.0, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(self.url.0).into());
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build().map_err(ApiError::from)?
            }
        };

        Ok(DataClient {
            inner: Arc::new(DataClientInner {
                url,
                auth: self.auth.0,
                http_client,
                timeout: self.timeout,
                list_limit: self.list_limit,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_rejects_bad_url() {
        let result = DataClient::builder()
            .url("not a url")
            .auth(DataAuth::ApiKey("k".into()))
            .build();
        assert!(matches!(result, Err(Error::Api(ApiError::InvalidUrl(_)))));

        let result = DataClient::builder()
            .url("ftp://example.com/graphql")
            .auth(DataAuth::ApiKey("k".into()))
            .build();
        assert!(matches!(result, Err(Error::Api(ApiError::InvalidUrl(_)))));
    }

    #[test]
    fn test_build_defaults() {
        let client = DataClient::builder()
            .url("https://example.com/graphql")
            .auth(DataAuth::Token("t".into()))
            .list_limit(0)
            .build()
            .unwrap();
        assert_eq!(client.url().as_str(), "https://example.com/graphql");
        assert_eq!(client.list_limit(), 1);
    }

    #[test]
    fn test_auth_debug_hides_secret() {
        let auth = DataAuth::ApiKey("da2-secret".into());
        assert_eq!(format!("{:?}", auth), "ApiKey(***)");
    }

    #[test]
    fn test_outputs_without_api_key() {
        let json = r#"{
            "data": {
                "url": "https://x.appsync-api.us-east-1.amazonaws.com/graphql",
                "default_authorization_type": "AMAZON_COGNITO_USER_POOLS"
            }
        }"#;
        let outputs: BackendOutputs = serde_json::from_str(json).unwrap();

        match DataClient::from_backend_outputs(outputs) {
            Err(Error::Config(ConfigError::MissingApiKey { authorization })) => {
                assert_eq!(authorization, "AMAZON_COGNITO_USER_POOLS");
            }
            Err(other) => panic!("unexpected error {:?}", other),
            Ok(_) => panic!("built a client without an API key"),
        }

        let outputs: BackendOutputs = serde_json::from_str(r#"{ "version": "1" }"#).unwrap();
        assert!(matches!(
            DataClient::from_backend_outputs(outputs),
            Err(Error::Config(ConfigError::MissingDataSection))
        ));
    }

    #[test]
    fn test_parse_outputs() {
        let json = r#"{
            "version": "1",
            "data": {
                "url": "https://x.appsync-api.us-east-1.amazonaws.com/graphql",
                "aws_region": "us-east-1",
                "api_key": "da2-abc",
                "default_authorization_type": "API_KEY"
            }
        }"#;
        let outputs: BackendOutputs = serde_json::from_str(json).unwrap();
        let data = outputs.data.unwrap();
        assert_eq!(data.api_key.as_deref(), Some("da2-abc"));
        assert_eq!(data.default_authorization_type.as_deref(), Some("API_KEY"));
    }
}
