//! Per-instance connection configuration.

use serde::Deserialize;

/// Configuration for one GitHub or GitHub Enterprise instance.
///
/// Field names follow the external configuration schema (camelCase).
/// A config is immutable once loaded; changing it means rebuilding the
/// connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Base URL of the code-hosting instance.
    pub url: String,

    /// API auth token.
    pub token: String,

    /// Optional PEM CA certificate for instances serving self-signed TLS.
    #[serde(default)]
    pub certificate: Option<String>,

    /// Ordered discovery query tokens. Defaults to `["affiliated"]`;
    /// `["none"]` disables query-driven discovery.
    #[serde(default = "default_repository_query")]
    pub repository_query: Vec<String>,

    /// Explicit `owner/name` entries to sync in addition to query results.
    #[serde(default)]
    pub repos: Vec<String>,

    /// Repo-URI template with `{host}` and `{nameWithOwner}` tokens.
    /// Empty means the default `{host}/{nameWithOwner}`.
    #[serde(default)]
    pub repository_path_pattern: String,

    /// Whether newly discovered repositories start out enabled.
    #[serde(default)]
    pub initial_repository_enablement: bool,
}

fn default_repository_query() -> Vec<String> {
    vec!["affiliated".to_string()]
}

impl ConnectionConfig {
    /// A config for `url`/`token` with every other field at its default.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            certificate: None,
            repository_query: default_repository_query(),
            repos: Vec::new(),
            repository_path_pattern: String::new(),
            initial_repository_enablement: false,
        }
    }
}
