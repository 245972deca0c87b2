//! GitHub API client for the sync worker.
//!
//! One [`GithubClient`] is bound to the derived API endpoint, token, and
//! transport of a single instance. The viewer's affiliated repositories
//! are paged through the GraphQL API with a server-issued cursor; explicit
//! `owner/name` entries go through the REST API. Both paths feed the
//! client's rate-limit monitor as responses come back.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for GitHub API operations
//! - [`rate_limit`] - Call-budget accounting shared across callers
//! - [`types`] - Wire payload types
//! - [`client`] - The client itself

mod client;
mod error;
mod rate_limit;
mod types;

pub use client::GithubClient;
pub use error::GithubError;
pub use rate_limit::RateLimitMonitor;
pub use types::split_repository_name_with_owner;
