//! Wire payload types for the GitHub API.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::GithubError;
use crate::host::RemoteRepo;

/// Split an `owner/name` string into its halves.
///
/// Entries without a separator, with an empty half, or with extra slashes
/// are rejected.
pub fn split_repository_name_with_owner(
    name_with_owner: &str,
) -> Result<(&str, &str), GithubError> {
    let (owner, name) = name_with_owner
        .split_once('/')
        .ok_or_else(|| GithubError::InvalidNameWithOwner(name_with_owner.to_string()))?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return Err(GithubError::InvalidNameWithOwner(name_with_owner.to_string()));
    }
    Ok((owner, name))
}

/// GraphQL envelope for the viewer-repositories query.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlResponse {
    pub data: Option<ViewerData>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphqlErrorItem {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ViewerData {
    pub viewer: ViewerNode,
    pub rate_limit: Option<GraphqlRateLimit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewerNode {
    pub repositories: RepositoryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepositoryConnection {
    pub nodes: Vec<GraphqlRepo>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphqlRepo {
    pub id: String,
    pub name_with_owner: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_fork: bool,
}

impl GraphqlRepo {
    pub fn into_remote(self) -> RemoteRepo {
        RemoteRepo {
            id: self.id,
            name_with_owner: self.name_with_owner,
            description: self.description,
            is_fork: self.is_fork,
        }
    }
}

/// The `rateLimit` selection attached to every GraphQL query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphqlRateLimit {
    pub cost: usize,
    pub limit: usize,
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// REST repository payload, used for explicit `owner/name` fetches.
#[derive(Debug, Deserialize)]
pub(crate) struct RestRepo {
    pub node_id: String,
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub fork: bool,
}

impl RestRepo {
    pub fn into_remote(self) -> RemoteRepo {
        RemoteRepo {
            id: self.node_id,
            name_with_owner: self.full_name,
            description: self.description,
            is_fork: self.fork,
        }
    }
}
