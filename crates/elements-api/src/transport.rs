//! HTTP seam between the record client and the network.

use crate::{Error, Result};
use log::debug;
use reqwest::Url;
use std::fmt;
use std::io::Read;
use std::time::Duration;

/// A GET request against an API endpoint relative to the server base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// Endpoint path, e.g. `api/2/media/files`.
    pub endpoint: String,
    /// Query parameters in the order they are sent.
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: Vec::new(),
        }
    }

    pub fn query(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Value of the first query parameter called `name`.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.endpoint)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{}{}={}", sep, key, value)?;
        }
        Ok(())
    }
}

/// Response body handed back by an [`HttpClient`].
pub type Body = Box<dyn Read + Send>;

/// Pluggable HTTP backend.
///
/// Implementations return the body of a successful response; any non-2xx
/// status must be reported as [`Error::Http`].
pub trait HttpClient: Send + Sync {
    fn get(&self, request: &ApiRequest) -> Result<Body>;
}

/// Credentials sent with every request.
#[derive(Debug, Clone, Default)]
pub enum Credentials {
    #[default]
    None,
    Bearer(String),
    Basic {
        username: String,
        password: Option<String>,
    },
}

/// Blocking [`HttpClient`] backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    base_url: Url,
    credentials: Credentials,
}

impl ReqwestClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Self::from_client(client, base_url, credentials)
    }

    /// Wrap an existing [`reqwest::blocking::Client`].
    pub fn from_client(
        client: reqwest::blocking::Client,
        base_url: &str,
        credentials: Credentials,
    ) -> Result<Self> {
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL for `request`.
    pub fn url_for(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self
            .base_url
            .join(request.endpoint.trim_start_matches('/'))
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", request.endpoint, e)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(request.query.iter());
        }
        Ok(url)
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, request: &ApiRequest) -> Result<Body> {
        let url = self.url_for(request)?;
        debug!("GET {}", url);

        let mut builder = self.client.get(url.clone());
        builder = match &self.credentials {
            Credentials::None => builder,
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, password.as_ref())
            }
        };

        let response = builder
            .send()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(Box::new(response))
    }
}

/// Endpoints are joined relative to the base, which only works when the base
/// path ends in `/`.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|e| Error::InvalidUrl(format!("{}: {}", base_url, e)))
}
