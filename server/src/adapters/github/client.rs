//! GitHub REST API client implementation

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use urlencoding::encode;

use crate::domain::ports::{
    ContributorStats, ContributorStatsResponse, GithubClient, GithubCommit, GithubPullRequest,
    GithubRepo, PER_PAGE,
};
use crate::error::GithubError;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("ghpulse/", env!("CARGO_PKG_VERSION"));

/// Implementation of the GitHub API client
pub struct GithubClientImpl {
    http: Client,
    base_url: String,
}

impl GithubClientImpl {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn repo_url(&self, repo: &GithubRepo, suffix: &str) -> String {
        self.api_url(&format!(
            "/repos/{}/{}{}",
            encode(&repo.owner.login),
            encode(&repo.name),
            suffix
        ))
    }

    async fn get(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, GithubError> {
        tracing::debug!("GET {} {:?}", url, query);

        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .query(query)
            .send()
            .await?;

        if let Some(remaining) = rate_limit_remaining(resp.headers()) {
            tracing::debug!(remaining, "GitHub rate limit budget");
        }

        Ok(resp)
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GithubError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| GithubError::Deserialization(e.to_string()))
        } else {
            Err(error_for_status(status, response).await)
        }
    }
}

fn page_query(page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("per_page", PER_PAGE.to_string()),
        ("page", page.to_string()),
    ]
}

/// Oldest first, so new pull requests only ever land on the last page and
/// earlier pages keep their contents between passes.
fn pulls_query(author: &str, page: u32) -> Vec<(&'static str, String)> {
    // `author` is not a real filter on this endpoint; relevance is decided
    // per item by the caller.
    let mut query = vec![
        ("author", author.to_string()),
        ("state", "all".to_string()),
        ("sort", "created".to_string()),
        ("direction", "asc".to_string()),
    ];
    query.extend(page_query(page));
    query
}

fn header_i64(headers: &HeaderMap, name: &str) -> Option<i64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

fn rate_limit_remaining(headers: &HeaderMap) -> Option<i64> {
    header_i64(headers, "x-ratelimit-remaining")
}

/// GitHub signals an exhausted budget with 429, or with 403 and a zero remaining count
fn is_rate_limited(status: StatusCode, headers: &HeaderMap) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && rate_limit_remaining(headers) == Some(0))
}

async fn error_for_status(status: StatusCode, response: reqwest::Response) -> GithubError {
    if status == StatusCode::UNAUTHORIZED {
        return GithubError::Unauthorized;
    }
    if is_rate_limited(status, response.headers()) {
        let reset = header_i64(response.headers(), "x-ratelimit-reset");
        tracing::warn!(?reset, "GitHub rate limit exhausted");
        return GithubError::RateLimited { reset };
    }

    let message = response.text().await.unwrap_or_default();
    GithubError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl GithubClient for GithubClientImpl {
    async fn list_repos_page(
        &self,
        token: &str,
        page: u32,
    ) -> Result<Vec<GithubRepo>, GithubError> {
        let resp = self
            .get(&self.api_url("/user/repos"), token, &page_query(page))
            .await?;

        self.handle_response(resp).await
    }

    async fn list_commits_page(
        &self,
        token: &str,
        repo: &GithubRepo,
        author: &str,
        page: u32,
    ) -> Result<Vec<GithubCommit>, GithubError> {
        let mut query = vec![("author", author.to_string())];
        query.extend(page_query(page));

        let resp = self
            .get(&self.repo_url(repo, "/commits"), token, &query)
            .await?;

        self.handle_response(resp).await
    }

    async fn list_pulls_page(
        &self,
        token: &str,
        repo: &GithubRepo,
        author: &str,
        page: u32,
    ) -> Result<Vec<GithubPullRequest>, GithubError> {
        let resp = self
            .get(&self.repo_url(repo, "/pulls"), token, &pulls_query(author, page))
            .await?;

        self.handle_response(resp).await
    }

    async fn get_contributor_stats(
        &self,
        token: &str,
        repo: &GithubRepo,
    ) -> Result<ContributorStatsResponse, GithubError> {
        let resp = self
            .get(&self.repo_url(repo, "/stats/contributors"), token, &[])
            .await?;

        match resp.status() {
            StatusCode::ACCEPTED => Ok(ContributorStatsResponse::Computing),
            StatusCode::OK => {
                let stats: Vec<ContributorStats> = self.handle_response(resp).await?;
                Ok(ContributorStatsResponse::Ready(stats))
            }
            status if status == StatusCode::UNAUTHORIZED
                || is_rate_limited(status, resp.headers()) =>
            {
                Err(error_for_status(status, resp).await)
            }
            status => Ok(ContributorStatsResponse::Unavailable {
                status: status.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::github::GithubUser;
    use reqwest::header::HeaderValue;

    fn repo(owner: &str, name: &str) -> GithubRepo {
        GithubRepo {
            id: 1,
            name: name.to_string(),
            full_name: format!("{}/{}", owner, name),
            owner: GithubUser {
                login: owner.to_string(),
            },
        }
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = GithubClientImpl::new("https://api.github.com/".to_string());
        assert_eq!(client.api_url("/user/repos"), "https://api.github.com/user/repos");
    }

    #[test]
    fn repo_url_encodes_path_segments() {
        let client = GithubClientImpl::new("https://api.github.com".to_string());
        assert_eq!(
            client.repo_url(&repo("octo cat", "hello"), "/commits"),
            "https://api.github.com/repos/octo%20cat/hello/commits"
        );
    }

    #[test]
    fn page_query_requests_full_pages() {
        let query = page_query(3);
        assert!(query.contains(&("per_page", "100".to_string())));
        assert!(query.contains(&("page", "3".to_string())));
    }

    #[test]
    fn pulls_are_listed_oldest_first() {
        let query = pulls_query("octocat", 2);
        assert!(query.contains(&("state", "all".to_string())));
        assert!(query.contains(&("sort", "created".to_string())));
        assert!(query.contains(&("direction", "asc".to_string())));
        assert!(query.contains(&("page", "2".to_string())));
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        assert!(is_rate_limited(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new()));
    }

    #[test]
    fn forbidden_is_rate_limited_only_when_budget_is_spent() {
        let mut headers = HeaderMap::new();
        assert!(!is_rate_limited(StatusCode::FORBIDDEN, &headers));

        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        assert!(is_rate_limited(StatusCode::FORBIDDEN, &headers));

        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("12"));
        assert!(!is_rate_limited(StatusCode::FORBIDDEN, &headers));
    }
}
