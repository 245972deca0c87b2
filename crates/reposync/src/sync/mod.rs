//! The sync worker itself.
//!
//! # Module Structure
//!
//! - [`connection`] - URL normalization and connection construction
//! - [`scheduler`] - Rate-limit-aware perpetual loops, one per connection
//! - [`enumerate`] - Two-producer enumeration of a connection's repositories
//! - [`dispatch`] - Mapping enumerated repositories onto catalog requests

pub mod connection;
pub mod dispatch;
pub mod enumerate;
pub mod scheduler;

pub use connection::{Connection, ConnectionError, derive_api_url, normalize_base_url};
pub use dispatch::{
    DEFAULT_REPOSITORY_PATH_PATTERN, GITHUB_SERVICE_TYPE, RepoIdentity, RepoSyncRequest,
    repo_identity, repo_path, update_repositories,
};
pub use enumerate::{RepositoryQuery, UnrecognizedQuery, list_all_repositories};
pub use scheduler::{
    DEFAULT_UPDATE_INTERVAL, PAGE_SIZE, RATE_LIMIT_RESET_MARGIN, RATE_LIMIT_SAFETY_THRESHOLD,
    SyncWorker,
};
