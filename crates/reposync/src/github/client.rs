//! GitHub API client bound to one instance.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use serde_json::json;
use url::Url;

use super::error::GithubError;
use super::rate_limit::RateLimitMonitor;
use super::types::{GraphqlRepo, GraphqlResponse, RestRepo};
use crate::host::{self, HostClient, HostError, RateLimitSnapshot, RemoteRepo, RepoPage};
use crate::http::{HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport};

/// GraphQL query walking the caller's affiliated repositories.
///
/// The inline `rateLimit` selection keeps the budget monitor current with
/// every page.
const VIEWER_REPOSITORIES_QUERY: &str = "\
query AffiliatedRepositories($first: Int!, $after: String) {
  viewer {
    repositories(first: $first, after: $after, affiliations: [OWNER, ORGANIZATION_MEMBER, COLLABORATOR]) {
      nodes { id nameWithOwner description isFork }
      pageInfo { hasNextPage endCursor }
    }
  }
  rateLimit { cost limit remaining resetAt }
}";

/// Client for one GitHub or GitHub Enterprise API endpoint.
///
/// Cheap to clone; all clones share the transport and the rate-limit
/// monitor, so concurrent callers see one consistent budget.
#[derive(Clone)]
pub struct GithubClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    api_url: Url,
    token: String,
    transport: Arc<dyn HttpTransport>,
    rate_limit: RateLimitMonitor,
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_url", &self.inner.api_url)
            .field("rate_limit", &self.inner.rate_limit)
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    /// Create a client bound to the derived API endpoint, token, and
    /// transport of one instance.
    pub fn new(api_url: Url, token: &str, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                api_url,
                token: token.to_string(),
                transport,
                rate_limit: RateLimitMonitor::new(),
            }),
        }
    }

    /// The API endpoint this client talks to.
    pub fn api_url(&self) -> &Url {
        &self.inner.api_url
    }

    fn endpoint(&self, segment: &str) -> String {
        let base = self.inner.api_url.as_str();
        if base.ends_with('/') {
            format!("{base}{segment}")
        } else {
            format!("{base}/{segment}")
        }
    }

    fn graphql_url(&self) -> String {
        // api.github.com and Enterprise `/api` roots both serve GraphQL
        // under `graphql`.
        self.endpoint("graphql")
    }

    fn rest_url(&self, path: &str) -> String {
        // REST lives at the API root on api.github.com and under `v3/` on
        // Enterprise API roots.
        if self.inner.api_url.host_str() == Some("api.github.com") {
            self.endpoint(path)
        } else {
            self.endpoint(&format!("v3/{path}"))
        }
    }

    fn base_headers(&self) -> HttpHeaders {
        vec![
            ("Accept".to_string(), "application/vnd.github+json".to_string()),
            ("User-Agent".to_string(), "reposync".to_string()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.inner.token),
            ),
        ]
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GithubError> {
        let response = self.inner.transport.send(request).await?;
        self.record_rest_rate_limit(&response);
        Ok(response)
    }

    /// Feed the monitor from `x-ratelimit-*` response headers, if present.
    fn record_rest_rate_limit(&self, response: &HttpResponse) {
        let Some(limit) = header_number::<usize>(response, "x-ratelimit-limit") else {
            return;
        };
        let Some(remaining) = header_number::<usize>(response, "x-ratelimit-remaining") else {
            return;
        };
        let Some(reset) = header_number::<i64>(response, "x-ratelimit-reset") else {
            return;
        };
        let Some(reset_at) = DateTime::from_timestamp(reset, 0) else {
            return;
        };
        self.inner.rate_limit.update(limit, remaining, reset_at);
    }

    async fn viewer_repositories_page(
        &self,
        first: usize,
        after: Option<&str>,
    ) -> Result<RepoPage, GithubError> {
        let body = serde_json::to_vec(&json!({
            "query": VIEWER_REPOSITORIES_QUERY,
            "variables": { "first": first, "after": after },
        }))
        .map_err(|e| GithubError::Decode(e.to_string()))?;

        let response = self
            .send(HttpRequest {
                method: HttpMethod::Post,
                url: self.graphql_url(),
                headers: self.base_headers(),
                body,
            })
            .await?;

        if response.status != 200 {
            return Err(GithubError::Status {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }

        let envelope: GraphqlResponse = serde_json::from_slice(&response.body)
            .map_err(|e| GithubError::Decode(e.to_string()))?;
        if let Some(err) = envelope.errors.first() {
            return Err(GithubError::Graphql(err.message.clone()));
        }
        let data = envelope
            .data
            .ok_or_else(|| GithubError::Decode("response carries no data".to_string()))?;

        let mut cost = 1;
        if let Some(rate) = data.rate_limit {
            cost = rate.cost;
            self.inner
                .rate_limit
                .update(rate.limit, rate.remaining, rate.reset_at);
        }

        let connection = data.viewer.repositories;
        let end_cursor = if connection.page_info.has_next_page {
            connection.page_info.end_cursor
        } else {
            None
        };

        Ok(RepoPage {
            repos: connection
                .nodes
                .into_iter()
                .map(GraphqlRepo::into_remote)
                .collect(),
            end_cursor,
            rate_limit_cost: cost,
        })
    }

    async fn repository(&self, owner: &str, name: &str) -> Result<RemoteRepo, GithubError> {
        let response = self
            .send(HttpRequest {
                method: HttpMethod::Get,
                url: self.rest_url(&format!("repos/{owner}/{name}")),
                headers: self.base_headers(),
                body: Vec::new(),
            })
            .await?;

        match response.status {
            200 => {
                let repo: RestRepo = serde_json::from_slice(&response.body)
                    .map_err(|e| GithubError::Decode(e.to_string()))?;
                Ok(repo.into_remote())
            }
            404 => Err(GithubError::RepoNotFound(format!("{owner}/{name}"))),
            status => Err(GithubError::Status {
                status,
                message: String::from_utf8_lossy(&response.body).into_owned(),
            }),
        }
    }
}

fn header_number<T: std::str::FromStr>(response: &HttpResponse, name: &str) -> Option<T> {
    response.header(name).and_then(|v| v.parse().ok())
}

#[async_trait]
impl HostClient for GithubClient {
    async fn list_viewer_repositories(
        &self,
        first: usize,
        after: Option<&str>,
    ) -> host::Result<RepoPage> {
        self.viewer_repositories_page(first, after)
            .await
            .map_err(HostError::from)
    }

    async fn get_repository(&self, owner: &str, name: &str) -> host::Result<RemoteRepo> {
        self.repository(owner, name).await.map_err(HostError::from)
    }

    fn rate_limit(&self) -> Option<RateLimitSnapshot> {
        self.inner.rate_limit.snapshot()
    }

    fn recommended_wait(&self, cost: usize) -> Duration {
        self.inner.rate_limit.recommended_wait(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MockTransport;

    fn dotcom_client(transport: &MockTransport) -> GithubClient {
        GithubClient::new(
            Url::parse("https://api.github.com/").expect("url"),
            "token",
            Arc::new(transport.clone()),
        )
    }

    fn enterprise_client(transport: &MockTransport) -> GithubClient {
        GithubClient::new(
            Url::parse("https://ghe.example.com/api").expect("url"),
            "token",
            Arc::new(transport.clone()),
        )
    }

    fn graphql_page_body(names: &[&str], end_cursor: Option<&str>, remaining: usize) -> String {
        let nodes: Vec<serde_json::Value> = names
            .iter()
            .map(|name| {
                json!({
                    "id": format!("id-{name}"),
                    "nameWithOwner": name,
                    "description": "a repo",
                    "isFork": false,
                })
            })
            .collect();
        json!({
            "data": {
                "viewer": {
                    "repositories": {
                        "nodes": nodes,
                        "pageInfo": {
                            "hasNextPage": end_cursor.is_some(),
                            "endCursor": end_cursor,
                        },
                    },
                },
                "rateLimit": {
                    "cost": 1,
                    "limit": 5000,
                    "remaining": remaining,
                    "resetAt": "2030-01-01T00:00:00Z",
                },
            },
        })
        .to_string()
    }

    #[tokio::test]
    async fn viewer_listing_follows_the_cursor_and_updates_the_budget() {
        let transport = MockTransport::new();
        let client = dotcom_client(&transport);
        let url = "https://api.github.com/graphql";

        transport.push_json(
            HttpMethod::Post,
            url,
            &graphql_page_body(&["a/one", "a/two"], Some("CURSOR"), 4999),
        );
        transport.push_json(HttpMethod::Post, url, &graphql_page_body(&["a/three"], None, 4998));

        let first = client
            .list_viewer_repositories(100, None)
            .await
            .expect("first page");
        assert_eq!(first.repos.len(), 2);
        assert_eq!(first.end_cursor.as_deref(), Some("CURSOR"));
        assert_eq!(first.rate_limit_cost, 1);

        let second = client
            .list_viewer_repositories(100, first.end_cursor.as_deref())
            .await
            .expect("second page");
        assert_eq!(second.repos.len(), 1);
        assert!(second.end_cursor.is_none());

        let snapshot = client.rate_limit().expect("budget known");
        assert_eq!(snapshot.remaining, 4998);

        // The second request must carry the cursor from the first.
        let requests = transport.requests();
        let variables: serde_json::Value =
            serde_json::from_slice(&requests[1].body).expect("request body");
        assert_eq!(variables["variables"]["after"], json!("CURSOR"));
        assert_eq!(variables["variables"]["first"], json!(100));
    }

    #[tokio::test]
    async fn graphql_errors_surface_as_api_errors() {
        let transport = MockTransport::new();
        let client = dotcom_client(&transport);
        transport.push_json(
            HttpMethod::Post,
            "https://api.github.com/graphql",
            r#"{"data": null, "errors": [{"message": "token scope missing"}]}"#,
        );

        let err = client
            .list_viewer_repositories(100, None)
            .await
            .expect_err("must fail");
        match err {
            HostError::Api { message } => assert!(message.contains("token scope")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rest_fetch_parses_repo_and_reads_rate_limit_headers() {
        let transport = MockTransport::new();
        let client = dotcom_client(&transport);
        transport.push_response(
            HttpMethod::Get,
            "https://api.github.com/repos/octocat/hello-world",
            HttpResponse {
                status: 200,
                headers: vec![
                    ("x-ratelimit-limit".to_string(), "5000".to_string()),
                    ("x-ratelimit-remaining".to_string(), "1234".to_string()),
                    ("x-ratelimit-reset".to_string(), "1893456000".to_string()),
                ],
                body: br#"{
                    "node_id": "R_1",
                    "full_name": "octocat/hello-world",
                    "description": "demo",
                    "fork": true
                }"#
                .to_vec(),
            },
        );

        let repo = client
            .get_repository("octocat", "hello-world")
            .await
            .expect("fetch");
        assert_eq!(repo.id, "R_1");
        assert_eq!(repo.name_with_owner, "octocat/hello-world");
        assert!(repo.is_fork);

        let snapshot = client.rate_limit().expect("headers fed the monitor");
        assert_eq!(snapshot.remaining, 1234);
    }

    #[tokio::test]
    async fn rest_404_maps_to_not_found() {
        let transport = MockTransport::new();
        let client = dotcom_client(&transport);
        transport.push_response(
            HttpMethod::Get,
            "https://api.github.com/repos/octocat/gone",
            HttpResponse {
                status: 404,
                headers: Vec::new(),
                body: b"{}".to_vec(),
            },
        );

        let err = client
            .get_repository("octocat", "gone")
            .await
            .expect_err("must fail");
        assert!(matches!(err, HostError::NotFound { .. }));
    }

    #[tokio::test]
    async fn enterprise_endpoints_carry_the_api_prefix() {
        let transport = MockTransport::new();
        let client = enterprise_client(&transport);

        transport.push_json(
            HttpMethod::Post,
            "https://ghe.example.com/api/graphql",
            &graphql_page_body(&[], None, 5000),
        );
        transport.push_json(
            HttpMethod::Get,
            "https://ghe.example.com/api/v3/repos/team/app",
            r#"{"node_id": "R_2", "full_name": "team/app", "description": null}"#,
        );

        client
            .list_viewer_repositories(100, None)
            .await
            .expect("graphql route");
        let repo = client.get_repository("team", "app").await.expect("rest route");
        assert_eq!(repo.name_with_owner, "team/app");
    }

    #[tokio::test]
    async fn requests_are_authenticated() {
        let transport = MockTransport::new();
        let client = dotcom_client(&transport);
        transport.push_json(
            HttpMethod::Post,
            "https://api.github.com/graphql",
            &graphql_page_body(&[], None, 5000),
        );

        client
            .list_viewer_repositories(100, None)
            .await
            .expect("call");

        let requests = transport.requests();
        let auth = requests[0]
            .headers
            .iter()
            .find(|(k, _)| k == "Authorization")
            .map(|(_, v)| v.as_str());
        assert_eq!(auth, Some("Bearer token"));
    }
}
