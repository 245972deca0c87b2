//! GitHub API error types.

use thiserror::Error;

use crate::host::HostError;
use crate::http::HttpError;

/// Errors from talking to a GitHub or GitHub Enterprise API.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("http error: {0}")]
    Http(#[from] HttpError),

    #[error("GitHub API returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("GraphQL error: {0}")]
    Graphql(String),

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("repository not found: {0}")]
    RepoNotFound(String),

    #[error("invalid repository name {0:?}, expected \"owner/name\"")]
    InvalidNameWithOwner(String),
}

impl From<GithubError> for HostError {
    fn from(err: GithubError) -> Self {
        match err {
            GithubError::Http(e) => HostError::network(e.to_string()),
            GithubError::Status { status, .. } if status == 401 || status == 403 => {
                HostError::AuthRequired
            }
            GithubError::Status { status, message } => {
                HostError::api(format!("status {status}: {message}"))
            }
            GithubError::Graphql(message) => HostError::api(message),
            GithubError::RepoNotFound(name) => HostError::not_found(name),
            GithubError::Decode(message) => HostError::internal(message),
            err @ GithubError::InvalidNameWithOwner(_) => HostError::internal(err.to_string()),
        }
    }
}
