//! Mapping enumerated repositories onto catalog sync requests.

use serde::Serialize;
use tokio::sync::mpsc;
use url::Url;

use super::connection::{Connection, normalize_base_url};
use super::enumerate::list_all_repositories;
use crate::host::{HostClient, RemoteRepo};

/// `serviceType` value for repositories hosted on GitHub or GitHub
/// Enterprise. The service ID is the instance's normalized base URL.
pub const GITHUB_SERVICE_TYPE: &str = "github";

/// Default repo-URI template.
pub const DEFAULT_REPOSITORY_PATH_PATTERN: &str = "{host}/{nameWithOwner}";

/// Durable cross-reference key for a repository in the catalog.
///
/// The triple survives renames on the host side, which is what makes it
/// usable as the catalog's stable identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoIdentity {
    /// Host-assigned repository ID.
    pub remote_id: String,
    pub service_type: String,
    /// Normalized base URL of the hosting instance.
    pub service_id: String,
}

/// One create-or-update request for the catalog.
///
/// The consumer's contract is an idempotent upsert keyed by
/// (`repo_uri`, `identity`): redelivery of the same request is a no-op
/// beyond the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSyncRequest {
    pub repo_uri: String,
    pub identity: RepoIdentity,
    pub description: Option<String>,
    pub fork: bool,
    pub enabled: bool,
}

/// Identity triple for `repo` as hosted on the instance at `base_url`.
pub fn repo_identity(repo: &RemoteRepo, base_url: &Url) -> RepoIdentity {
    RepoIdentity {
        remote_id: repo.id.clone(),
        service_type: GITHUB_SERVICE_TYPE.to_string(),
        service_id: normalize_base_url(base_url.clone()).to_string(),
    }
}

/// Render the repo URI for `name_with_owner` under `pattern`.
///
/// An empty pattern means the default `{host}/{nameWithOwner}`.
pub fn repo_path(pattern: &str, host: &str, name_with_owner: &str) -> String {
    let pattern = if pattern.is_empty() {
        DEFAULT_REPOSITORY_PATH_PATTERN
    } else {
        pattern
    };
    pattern
        .replace("{host}", host)
        .replace("{nameWithOwner}", name_with_owner)
}

/// Run one enumerate-and-dispatch cycle for `conn`.
///
/// Every repository the enumerator yields becomes a [`RepoSyncRequest`] on
/// `requests`. Failures inside enumeration are logged there and never
/// surface here; a closed dispatch channel ends the cycle early.
pub async fn update_repositories<C>(conn: &Connection<C>, requests: &mpsc::Sender<RepoSyncRequest>)
where
    C: HostClient + Clone + 'static,
{
    let mut repos = list_all_repositories(conn);
    while let Some(repo) = repos.recv().await {
        if requests.send(sync_request(conn, &repo)).await.is_err() {
            tracing::warn!(host = conn.original_hostname(), "dispatch channel closed, abandoning cycle");
            return;
        }
    }
}

fn sync_request<C>(conn: &Connection<C>, repo: &RemoteRepo) -> RepoSyncRequest {
    RepoSyncRequest {
        repo_uri: repo_path(
            &conn.config().repository_path_pattern,
            conn.original_hostname(),
            &repo.name_with_owner,
        ),
        identity: repo_identity(repo, conn.base_url()),
        description: repo.description.clone(),
        fork: repo.is_fork,
        enabled: conn.config().initial_repository_enablement,
    }
}
