//! Rate-limit-aware scheduling of the per-connection sync loops.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::connection::Connection;
use super::dispatch::{RepoSyncRequest, update_repositories};
use crate::config::ConnectionConfig;
use crate::github::GithubClient;
use crate::host::HostClient;

/// Maximum `first` parameter the host API accepts; also the capacity of
/// the enumeration channel.
pub const PAGE_SIZE: usize = 100;

/// Remaining-call floor under which a cycle is deferred until the reset.
pub const RATE_LIMIT_SAFETY_THRESHOLD: usize = 200;

/// Slack added on top of the reported reset time before resuming.
pub const RATE_LIMIT_RESET_MARGIN: Duration = Duration::from_secs(10);

/// Default pause between two sync cycles of one connection.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60);

/// Supervisor for the per-connection sync loops.
///
/// Each surviving connection gets one task that loops until the
/// cancellation token fires; a cycle already in flight runs to natural
/// completion first. [`SyncWorker::run`] joins every task at teardown, so
/// nothing outlives the worker.
pub struct SyncWorker<C = GithubClient> {
    connections: Vec<Connection<C>>,
    interval: Duration,
    requests: mpsc::Sender<RepoSyncRequest>,
}

impl SyncWorker<GithubClient> {
    /// Build a connection per config and prepare the worker.
    ///
    /// A connection that fails to build is logged and dropped; the others
    /// proceed.
    pub fn new(configs: Vec<ConnectionConfig>, requests: mpsc::Sender<RepoSyncRequest>) -> Self {
        let mut connections = Vec::with_capacity(configs.len());
        for config in configs {
            let url = config.url.clone();
            match Connection::build(config) {
                Ok(conn) => connections.push(conn),
                Err(err) => {
                    tracing::error!(url = %url, error = %err, "dropping misconfigured connection");
                }
            }
        }
        Self {
            connections,
            interval: DEFAULT_UPDATE_INTERVAL,
            requests,
        }
    }
}

impl<C> SyncWorker<C>
where
    C: HostClient + Clone + 'static,
{
    /// Supervise pre-built connections.
    pub fn with_connections(
        connections: Vec<Connection<C>>,
        requests: mpsc::Sender<RepoSyncRequest>,
    ) -> Self {
        Self {
            connections,
            interval: DEFAULT_UPDATE_INTERVAL,
            requests,
        }
    }

    /// Override the inter-cycle interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Number of connections that survived construction.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Run every connection's loop until `cancel` fires, then join them.
    pub async fn run(self, cancel: CancellationToken) {
        let SyncWorker {
            connections,
            interval,
            requests,
        } = self;

        if connections.is_empty() {
            tracing::warn!("no connections configured, sync worker exiting");
            return;
        }

        let mut tasks = JoinSet::new();
        for conn in connections {
            tasks.spawn(run_connection(
                conn,
                requests.clone(),
                interval,
                cancel.clone(),
            ));
        }
        drop(requests);

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "connection sync task failed");
            }
        }
    }
}

/// The perpetual loop for one connection.
///
/// Nothing inside a cycle terminates the loop; only cancellation does,
/// observed between suspension points.
async fn run_connection<C>(
    conn: Connection<C>,
    requests: mpsc::Sender<RepoSyncRequest>,
    interval: Duration,
    cancel: CancellationToken,
) where
    C: HostClient + Clone + 'static,
{
    loop {
        if cancel.is_cancelled() {
            return;
        }

        if let Some(limits) = conn.client().rate_limit()
            && limits.remaining < RATE_LIMIT_SAFETY_THRESHOLD
        {
            let wait = limits.reset_in + RATE_LIMIT_RESET_MARGIN;
            tracing::warn!(
                host = conn.original_hostname(),
                rate_limit_remaining = limits.remaining,
                wait_secs = wait.as_secs(),
                "rate limit nearly exhausted, waiting until it resets"
            );
            if sleep_or_cancelled(wait, &cancel).await {
                return;
            }
        }

        update_repositories(&conn, &requests).await;

        if sleep_or_cancelled(interval, &cancel).await {
            return;
        }
    }
}

/// Sleep for `duration` unless cancelled first; `true` means cancelled.
async fn sleep_or_cancelled(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}
