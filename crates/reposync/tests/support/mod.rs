//! Shared test support: a scripted host client.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reposync::host::{self, HostClient, HostError, RateLimitSnapshot, RemoteRepo, RepoPage};
use reposync::{Connection, ConnectionConfig};
use tokio::sync::mpsc;

/// One scripted answer to a viewer-listing call.
enum PageScript {
    Page(RepoPage),
    Fail,
}

#[derive(Default)]
struct State {
    pages: VecDeque<PageScript>,
    /// When the script runs out: repeat this page forever (no cursor).
    repeat_page: Option<Vec<RemoteRepo>>,
    /// When the script runs out and there is nothing to repeat: fail every
    /// listing call instead of returning an empty page.
    fail_when_empty: bool,
    repos: HashMap<String, Option<RemoteRepo>>,
    rate_limit: Option<RateLimitSnapshot>,
    cursors_seen: Vec<Option<String>>,
    fetches_seen: Vec<String>,
}

/// Scripted [`HostClient`] driving the enumerator and scheduler in tests.
///
/// Clones share state, mirroring the real client's shared budget monitor.
#[derive(Clone, Default)]
pub struct MockHost {
    inner: Arc<Mutex<State>>,
    list_events: Option<mpsc::UnboundedSender<()>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that also announces every viewer-listing call on a channel,
    /// for tests that assert *when* a cycle ran.
    pub fn with_list_events() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut host = Self::new();
        host.list_events = Some(tx);
        (host, rx)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn push_page(&self, repos: Vec<RemoteRepo>, end_cursor: Option<&str>) {
        self.lock().pages.push_back(PageScript::Page(RepoPage {
            repos,
            end_cursor: end_cursor.map(str::to_string),
            rate_limit_cost: 1,
        }));
    }

    pub fn push_listing_failure(&self) {
        self.lock().pages.push_back(PageScript::Fail);
    }

    pub fn repeat_page(&self, repos: Vec<RemoteRepo>) {
        self.lock().repeat_page = Some(repos);
    }

    pub fn fail_listings_when_script_runs_out(&self) {
        self.lock().fail_when_empty = true;
    }

    pub fn insert_repo(&self, name_with_owner: &str, repo: RemoteRepo) {
        self.lock()
            .repos
            .insert(name_with_owner.to_string(), Some(repo));
    }

    pub fn fail_repo(&self, name_with_owner: &str) {
        self.lock().repos.insert(name_with_owner.to_string(), None);
    }

    pub fn set_rate_limit(&self, remaining: usize, reset_in: Duration) {
        self.lock().rate_limit = Some(RateLimitSnapshot { remaining, reset_in });
    }

    /// Cursors passed to the viewer listing, in call order.
    pub fn cursors_seen(&self) -> Vec<Option<String>> {
        self.lock().cursors_seen.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.lock().cursors_seen.len()
    }

    /// `owner/name` strings actually fetched over the API.
    pub fn fetches_seen(&self) -> Vec<String> {
        self.lock().fetches_seen.clone()
    }
}

#[async_trait]
impl HostClient for MockHost {
    async fn list_viewer_repositories(
        &self,
        _first: usize,
        after: Option<&str>,
    ) -> host::Result<RepoPage> {
        if let Some(events) = &self.list_events {
            let _ = events.send(());
        }
        let mut state = self.lock();
        state.cursors_seen.push(after.map(str::to_string));
        match state.pages.pop_front() {
            Some(PageScript::Page(page)) => Ok(page),
            Some(PageScript::Fail) => Err(HostError::api("scripted listing failure")),
            None => {
                if let Some(repos) = &state.repeat_page {
                    Ok(RepoPage {
                        repos: repos.clone(),
                        end_cursor: None,
                        rate_limit_cost: 1,
                    })
                } else if state.fail_when_empty {
                    Err(HostError::network("scripted: host unreachable"))
                } else {
                    Ok(RepoPage::default())
                }
            }
        }
    }

    async fn get_repository(&self, owner: &str, name: &str) -> host::Result<RemoteRepo> {
        let key = format!("{owner}/{name}");
        let mut state = self.lock();
        state.fetches_seen.push(key.clone());
        match state.repos.get(&key) {
            Some(Some(repo)) => Ok(repo.clone()),
            Some(None) => Err(HostError::api("scripted fetch failure")),
            None => Err(HostError::not_found(key)),
        }
    }

    fn rate_limit(&self) -> Option<RateLimitSnapshot> {
        self.lock().rate_limit
    }

    fn recommended_wait(&self, _cost: usize) -> Duration {
        Duration::ZERO
    }
}

/// A repository with the given ID and `owner/name`.
pub fn remote_repo(id: &str, name_with_owner: &str) -> RemoteRepo {
    RemoteRepo {
        id: id.to_string(),
        name_with_owner: name_with_owner.to_string(),
        description: Some(format!("repo {name_with_owner}")),
        is_fork: false,
    }
}

/// `count` distinct repositories named `owner/prefix-N`.
pub fn remote_repos(prefix: &str, count: usize) -> Vec<RemoteRepo> {
    (0..count)
        .map(|n| remote_repo(&format!("id-{prefix}-{n}"), &format!("owner/{prefix}-{n}")))
        .collect()
}

/// A connection around a mock host.
pub fn mock_connection(config: ConnectionConfig, host: MockHost) -> Connection<MockHost> {
    Connection::with_client(config, host).expect("test config must parse")
}
