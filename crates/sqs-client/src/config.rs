//! Client configuration.
//!
//! A [`ClientConfig`] can be assembled in code (with `with_*` setters or the
//! [`ClientConfigBuilder`]) or loaded from an optional file plus `SQS__*`
//! environment variables with [`ClientConfig::load`].

use crate::auth::Credentials;
use crate::error::ConfigurationError;
use crate::protocol::API_VERSION;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Prefix of environment variables read by [`ClientConfig::load`]
pub const ENV_PREFIX: &str = "SQS";

/// Configuration for the queue service client
///
/// # Examples
///
/// ```
/// use sqs_client::{ClientConfig, Credentials};
/// use std::time::Duration;
///
/// let config = ClientConfig::new(Credentials::new("AKID", "secret"))
///     .with_region("eu-west-1")
///     .with_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.resolved_endpoint(), "https://sqs.eu-west-1.amazonaws.com");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Static credentials used to sign every request
    pub credentials: Credentials,
    /// Region used in the signing scope and the default endpoint
    pub region: String,
    /// Explicit endpoint; derived from the region when `None`
    pub endpoint: Option<String>,
    /// Timeout applied to each HTTP request
    pub timeout: Duration,
    pub user_agent: String,
    /// Query API version sent with every request
    pub api_version: String,
}

impl ClientConfig {
    /// Create a configuration with default region, endpoint and timeout
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("sqs-client/{}", env!("CARGO_PKG_VERSION")),
            api_version: API_VERSION.to_string(),
        }
    }

    /// Create a new builder for client configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Send requests to `endpoint` instead of the regional default
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// The endpoint requests are sent to
    pub fn resolved_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => default_endpoint(&self.region),
        }
    }

    /// Check the configuration and return the parsed endpoint
    pub fn validate(&self) -> Result<Url, ConfigurationError> {
        self.credentials.validate()?;

        if self.region.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                key: "region".to_string(),
            });
        }

        if self.timeout.is_zero() {
            return Err(ConfigurationError::Invalid {
                message: "timeout must be greater than zero".to_string(),
            });
        }

        if self.api_version.trim().is_empty() {
            return Err(ConfigurationError::Missing {
                key: "api_version".to_string(),
            });
        }

        let endpoint = self.resolved_endpoint();
        let url = Url::parse(&endpoint).map_err(|e| ConfigurationError::Invalid {
            message: format!("endpoint '{}' is not a valid URL: {}", endpoint, e),
        })?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ConfigurationError::Invalid {
                message: format!("endpoint '{}' must be an http(s) URL with a host", endpoint),
            });
        }

        Ok(url)
    }

    /// Load configuration from an optional file and the environment
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. built-in defaults
    /// 2. `path`, if given (format chosen by extension: TOML, YAML or JSON)
    /// 3. environment variables prefixed `SQS__`, e.g. `SQS__REGION` or
    ///    `SQS__ACCESS_KEY_ID`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading client configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(|e| ConfigurationError::Parsing {
                message: e.to_string(),
            })?
            .try_deserialize::<ClientSettings>()
            .map_err(|e| ConfigurationError::Parsing {
                message: e.to_string(),
            })?;

        let config = settings.into_config()?;
        config.validate()?;

        debug!(
            region = %config.region,
            endpoint = %config.resolved_endpoint(),
            timeout_secs = config.timeout.as_secs(),
            "Client configuration loaded"
        );

        Ok(config)
    }
}

fn default_endpoint(region: &str) -> String {
    if region.starts_with("cn-") {
        format!("https://sqs.{}.amazonaws.com.cn", region)
    } else {
        format!("https://sqs.{}.amazonaws.com", region)
    }
}

/// Serialized form of the configuration as read from files and environment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
    pub api_version: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
            user_agent: None,
            api_version: API_VERSION.to_string(),
        }
    }
}

impl ClientSettings {
    /// Convert into a [`ClientConfig`]; credentials are required
    pub fn into_config(self) -> Result<ClientConfig, ConfigurationError> {
        let access_key_id = self.access_key_id.ok_or_else(|| ConfigurationError::Missing {
            key: "access_key_id".to_string(),
        })?;
        let secret_access_key =
            self.secret_access_key
                .ok_or_else(|| ConfigurationError::Missing {
                    key: "secret_access_key".to_string(),
                })?;

        let mut credentials = Credentials::new(access_key_id, secret_access_key);
        credentials.session_token = self.session_token.filter(|t| !t.is_empty());

        let mut config = ClientConfig::new(credentials)
            .with_region(self.region)
            .with_timeout(Duration::from_secs(self.timeout_seconds))
            .with_api_version(self.api_version);
        config.endpoint = self.endpoint.filter(|e| !e.is_empty());
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }

        Ok(config)
    }
}

/// Builder for constructing `ClientConfig` instances.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    credentials: Option<Credentials>,
    region: Option<String>,
    endpoint: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build and validate the final configuration.
    pub fn build(self) -> Result<ClientConfig, ConfigurationError> {
        let credentials = self.credentials.ok_or_else(|| ConfigurationError::Missing {
            key: "credentials".to_string(),
        })?;

        let mut config = ClientConfig::new(credentials);
        if let Some(region) = self.region {
            config.region = region;
        }
        config.endpoint = self.endpoint;
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
