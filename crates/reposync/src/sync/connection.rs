//! Connection construction and base-URL normalization.

use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::config::ConnectionConfig;
use crate::github::GithubClient;
use crate::http::{self, HttpError, HttpTransport};

/// Errors that fail a single connection's construction.
///
/// Other configured connections are unaffected.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid instance URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("instance URL {0:?} has no host")]
    MissingHost(String),

    #[error("building transport: {0}")]
    Transport(#[from] HttpError),
}

/// Normalize a code-host base URL.
///
/// Lowercases the host and terminates the path with a slash so that
/// insignificant spelling differences collapse into one service ID.
/// Idempotent: normalizing an already-normalized URL is a no-op.
pub fn normalize_base_url(mut url: Url) -> Url {
    if let Some(host) = url.host_str() {
        let lowered = host.to_ascii_lowercase();
        if lowered != host {
            // Re-setting a host that just parsed cannot fail.
            let _ = url.set_host(Some(&lowered));
        }
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Derive the API endpoint for a normalized base URL.
///
/// github.com is served from its fixed API subdomain; an Enterprise
/// instance configured at the root of its host exposes the API under
/// `/api`, and one configured under a deeper path serves it there.
pub fn derive_api_url(base: &Url) -> Url {
    match base.host_str() {
        Some("github.com") | Some("www.github.com") => {
            Url::parse("https://api.github.com/").expect("literal URL")
        }
        _ => {
            let mut api = base.clone();
            if api.path() == "/" {
                api.set_path("/api");
            }
            api
        }
    }
}

/// An immutable handle to one configured code-host instance.
///
/// Built once at worker start and shared for the process's lifetime;
/// configuration changes mean building a new connection.
#[derive(Clone, Debug)]
pub struct Connection<C> {
    config: ConnectionConfig,
    base_url: Url,
    api_url: Url,
    original_hostname: String,
    client: C,
}

impl Connection<GithubClient> {
    /// Build a connection from its configuration.
    ///
    /// A malformed URL or an unusable CA certificate fails only this
    /// connection.
    pub fn build(config: ConnectionConfig) -> Result<Self, ConnectionError> {
        let (base_url, api_url, original_hostname) = derive_parts(&config)?;
        let transport: Arc<dyn HttpTransport> = match config.certificate.as_deref() {
            Some(pem) => Arc::new(http::transport_with_certificate(pem)?),
            None => Arc::new(http::default_transport()?),
        };
        let client = GithubClient::new(api_url.clone(), &config.token, transport);
        Ok(Self {
            config,
            base_url,
            api_url,
            original_hostname,
            client,
        })
    }
}

impl<C> Connection<C> {
    /// Build a connection around an existing client.
    pub fn with_client(config: ConnectionConfig, client: C) -> Result<Self, ConnectionError> {
        let (base_url, api_url, original_hostname) = derive_parts(&config)?;
        Ok(Self {
            config,
            base_url,
            api_url,
            original_hostname,
            client,
        })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Normalized instance base URL; doubles as the catalog service ID.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Hostname of the configured URL. Differs from the API host for
    /// github.com, whose API lives on api.github.com.
    pub fn original_hostname(&self) -> &str {
        &self.original_hostname
    }

    pub fn client(&self) -> &C {
        &self.client
    }
}

fn derive_parts(config: &ConnectionConfig) -> Result<(Url, Url, String), ConnectionError> {
    let parsed = Url::parse(&config.url).map_err(|source| ConnectionError::InvalidUrl {
        url: config.url.clone(),
        source,
    })?;
    let base_url = normalize_base_url(parsed);
    let original_hostname = base_url
        .host_str()
        .ok_or_else(|| ConnectionError::MissingHost(config.url.clone()))?
        .to_string();
    let api_url = derive_api_url(&base_url);
    Ok((base_url, api_url, original_hostname))
}
