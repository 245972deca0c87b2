//! The client contract between the sync worker and a code host.
//!
//! The scheduler and both enumerator producers only ever talk to the host
//! through [`HostClient`], so they can be driven by mock clients in tests
//! and stay independent of the wire protocol.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// A repository as reported by the remote code host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    /// Host-assigned opaque identifier, stable across renames.
    pub id: String,
    /// `owner/name` as reported by the host.
    pub name_with_owner: String,
    pub description: Option<String>,
    pub is_fork: bool,
}

/// One page of the caller's visible-repository listing.
#[derive(Debug, Clone, Default)]
pub struct RepoPage {
    pub repos: Vec<RemoteRepo>,
    /// Cursor for the next page; `None` when this page was the last.
    pub end_cursor: Option<String>,
    /// Rate-limit points the host charged for this page.
    pub rate_limit_cost: usize,
}

/// Point-in-time view of the host's call budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Calls left in the current window.
    pub remaining: usize,
    /// Time until the window resets.
    pub reset_in: Duration,
}

/// Errors surfaced by a host client.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host rejected or failed the call.
    #[error("API error: {message}")]
    Api { message: String },

    /// The requested resource does not exist or is not visible.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// The credentials were rejected.
    #[error("authentication required")]
    AuthRequired,

    /// The call never reached the host.
    #[error("network error: {message}")]
    Network { message: String },

    /// Anything the other variants don't cover.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl HostError {
    #[inline]
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    #[inline]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    #[inline]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[inline]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result type for host operations.
pub type Result<T> = std::result::Result<T, HostError>;

/// Client for one code-host instance.
///
/// Implementations own their rate-limit accounting internally and must be
/// safe to share: the two enumerator producers issue calls concurrently
/// through one clone-shared client, and the scheduler reads the budget
/// while cycles are in flight.
#[async_trait]
pub trait HostClient: Send + Sync {
    /// One page of the repositories visible to the authenticated caller,
    /// starting at the server-issued cursor `after` (`None` for the first
    /// page).
    async fn list_viewer_repositories(
        &self,
        first: usize,
        after: Option<&str>,
    ) -> Result<RepoPage>;

    /// Fetch a single repository by owner and name.
    async fn get_repository(&self, owner: &str, name: &str) -> Result<RemoteRepo>;

    /// Last-observed call budget; `None` until a response has been seen.
    fn rate_limit(&self) -> Option<RateLimitSnapshot>;

    /// How long a background operation of the given cost should pause
    /// before its next call. Zero while the budget is healthy.
    fn recommended_wait(&self, cost: usize) -> Duration;
}
