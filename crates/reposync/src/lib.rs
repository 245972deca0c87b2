//! Reposync - a background repository synchronization worker.
//!
//! This library keeps an internal catalog in step with the repository
//! inventory of one or more GitHub or GitHub Enterprise instances. Each
//! configured instance becomes an immutable [`Connection`]; a perpetual,
//! rate-limit-aware loop per connection enumerates the instance's visible
//! repositories and emits an idempotent create-or-update request for each
//! of them on a dispatch channel consumed by the catalog.
//!
//! # Example
//!
//! ```ignore
//! use reposync::{ConnectionConfig, RepoSyncRequest, SyncWorker};
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//!
//! let (tx, mut rx) = mpsc::channel::<RepoSyncRequest>(100);
//! let worker = SyncWorker::new(vec![ConnectionConfig::new(
//!     "https://github.com",
//!     "ghp_...",
//! )], tx);
//!
//! let cancel = CancellationToken::new();
//! tokio::spawn(worker.run(cancel.clone()));
//! while let Some(request) = rx.recv().await {
//!     catalog.create_or_update(request).await?;
//! }
//! ```

pub mod config;
pub mod github;
pub mod host;
pub mod http;
pub mod sync;

pub use config::ConnectionConfig;
pub use github::{GithubClient, GithubError};
pub use host::{HostClient, HostError, RateLimitSnapshot, RemoteRepo, RepoPage};
pub use sync::connection::{Connection, ConnectionError};
pub use sync::dispatch::{GITHUB_SERVICE_TYPE, RepoIdentity, RepoSyncRequest};
pub use sync::scheduler::{PAGE_SIZE, SyncWorker};
