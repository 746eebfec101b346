use crate::adapter::ElementsAdapter;
use crate::error::ConfigError;
use crate::roots::RootStrategy;
use elements_api::{Credentials, DownloadKey, ElementsClient, Endpoints, ReqwestClient};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    30
}

/// Connection and deployment settings for one Elements server.
///
/// ```toml
/// base_url = "https://elements.example.com"
/// token = "secret"
/// prefix = "projects"
/// root_strategy = "permission-scoped"
/// download_key = "bundle"
///
/// [endpoints]
/// download = "api/media/download/{id}"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementsConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub root_strategy: RootStrategy,
    #[serde(default)]
    pub download_key: DownloadKey,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl ElementsConfig {
    /// Config with defaults for everything but the server URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            username: None,
            password: None,
            prefix: String::new(),
            timeout_secs: default_timeout_secs(),
            root_strategy: RootStrategy::default(),
            download_key: DownloadKey::default(),
            endpoints: Endpoints::default(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url is required".to_string()));
        }
        if self.token.is_some() && self.username.is_some() {
            return Err(ConfigError::Invalid(
                "token and username are mutually exclusive".to_string(),
            ));
        }
        if !self.endpoints.download.contains("{id}") {
            return Err(ConfigError::Invalid(
                "endpoints.download must contain {id}".to_string(),
            ));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        match (&self.token, &self.username) {
            (Some(token), _) => Credentials::Bearer(token.clone()),
            (None, Some(username)) => Credentials::Basic {
                username: username.clone(),
                password: self.password.clone(),
            },
            (None, None) => Credentials::None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a client talking to the configured server over HTTP.
    pub fn build_client(&self) -> Result<ElementsClient, ConfigError> {
        self.validate()?;
        let http = ReqwestClient::new(&self.base_url, self.credentials(), self.timeout())?;
        Ok(ElementsClient::new(Arc::new(http))
            .with_endpoints(self.endpoints.clone())
            .with_download_key(self.download_key))
    }

    pub fn build_adapter(&self) -> Result<ElementsAdapter, ConfigError> {
        Ok(ElementsAdapter::with_options(
            self.build_client()?,
            &self.prefix,
            self.root_strategy,
        ))
    }
}
