//! Per-cycle enumeration of a connection's repositories.
//!
//! Two producers feed one bounded channel: a query-driven walk of the
//! caller's visible repositories and the explicit `owner/name` list. The
//! channel is sized to one API page, so a slow consumer holds both
//! producers back. It closes exactly once, after both producers finish;
//! interleaving between the producers is unspecified.

use std::str::FromStr;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::connection::Connection;
use super::scheduler::PAGE_SIZE;
use crate::github::split_repository_name_with_owner;
use crate::host::{HostClient, RemoteRepo, RepoPage};

/// A recognized `repositoryQuery` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryQuery {
    /// Walk the repositories affiliated with the authenticated caller.
    Affiliated,
    /// Discover nothing.
    None,
}

/// Error for query tokens this worker does not understand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized repositoryQuery token {0:?}")]
pub struct UnrecognizedQuery(pub String);

impl FromStr for RepositoryQuery {
    type Err = UnrecognizedQuery;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "affiliated" => Ok(Self::Affiliated),
            "none" => Ok(Self::None),
            other => Err(UnrecognizedQuery(other.to_string())),
        }
    }
}

/// Enumerate every repository visible to `conn`, for one sync cycle.
///
/// Returns the receiving end of the cycle's output channel. Failures are
/// handled producer-side: a failed page ends pagination for that query
/// token only, and a bad explicit entry is skipped; neither aborts the
/// cycle. Entries are not deduplicated across the two producers.
pub fn list_all_repositories<C>(conn: &Connection<C>) -> mpsc::Receiver<RemoteRepo>
where
    C: HostClient + Clone + 'static,
{
    let (tx, rx) = mpsc::channel(PAGE_SIZE);

    // An absent query list means affiliated; ["none"] disables discovery.
    let queries = if conn.config().repository_query.is_empty() {
        vec!["affiliated".to_string()]
    } else {
        conn.config().repository_query.clone()
    };

    let mut producers = JoinSet::new();
    producers.spawn(run_query_producer(conn.client().clone(), queries, tx.clone()));
    producers.spawn(run_listed_producer(
        conn.client().clone(),
        conn.config().repos.clone(),
        tx,
    ));

    // Both producers hold the only senders, so the channel closes when the
    // second one finishes. This task just reaps the join handles.
    tokio::spawn(async move {
        while let Some(joined) = producers.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "repository producer task failed");
            }
        }
    });

    rx
}

/// Producer A: query-driven discovery, token by token.
async fn run_query_producer<C: HostClient>(
    client: C,
    queries: Vec<String>,
    tx: mpsc::Sender<RemoteRepo>,
) {
    for query in &queries {
        match query.parse::<RepositoryQuery>() {
            Ok(RepositoryQuery::Affiliated) => {
                if !stream_affiliated(&client, &tx).await {
                    return;
                }
            }
            Ok(RepositoryQuery::None) => {}
            Err(err) => {
                tracing::error!(repository_query = %query, error = %err, "skipping query token");
            }
        }
    }
}

/// Page through the caller's affiliated repositories.
///
/// Returns `false` when the consumer went away and the producer should
/// stop entirely.
async fn stream_affiliated<C: HostClient>(client: &C, tx: &mpsc::Sender<RemoteRepo>) -> bool {
    let mut cursor: Option<String> = None;
    loop {
        let page = match client.list_viewer_repositories(PAGE_SIZE, cursor.as_deref()).await {
            Ok(page) => page,
            Err(err) => {
                // Pagination for this token is over for the cycle; the
                // next scheduled cycle starts afresh.
                tracing::error!(end_cursor = ?cursor, error = %err, "listing affiliated repositories failed");
                return true;
            }
        };

        let RepoPage {
            repos,
            end_cursor,
            rate_limit_cost,
        } = page;

        if let Some(limits) = client.rate_limit() {
            tracing::debug!(
                repos = repos.len(),
                rate_limit_cost,
                rate_limit_remaining = limits.remaining,
                "fetched affiliated repository page"
            );
        }

        for repo in repos {
            if tx.send(repo).await.is_err() {
                return false;
            }
        }

        match end_cursor {
            Some(next) => cursor = Some(next),
            None => return true,
        }

        tokio::time::sleep(client.recommended_wait(rate_limit_cost)).await;
    }
}

/// Producer B: the explicit `owner/name` list, entry by entry.
async fn run_listed_producer<C: HostClient>(
    client: C,
    repos: Vec<String>,
    tx: mpsc::Sender<RemoteRepo>,
) {
    for name_with_owner in &repos {
        let (owner, name) = match split_repository_name_with_owner(name_with_owner) {
            Ok(parts) => parts,
            Err(_) => {
                tracing::error!(name_with_owner = %name_with_owner, "invalid repository entry");
                continue;
            }
        };

        match client.get_repository(owner, name).await {
            Ok(repo) => {
                tracing::debug!(repo = %repo.name_with_owner, "fetched listed repository");
                if tx.send(repo).await.is_err() {
                    return;
                }
            }
            Err(err) => {
                tracing::error!(name_with_owner = %name_with_owner, error = %err, "fetching listed repository failed");
            }
        }

        // Zero-duration unless the budget is running low.
        tokio::time::sleep(client.recommended_wait(1)).await;
    }
}
