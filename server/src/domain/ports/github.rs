//! GitHub client port trait
//!
//! Defines the subset of the GitHub REST API the metrics engine reads from.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::GithubError;

/// Page size requested from every paginated endpoint
pub const PER_PAGE: usize = 100;

/// Helper to deserialize null as default (empty vec, etc.)
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// GitHub user representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubUser {
    pub login: String,
}

/// GitHub repository representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubRepo {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub owner: GithubUser,
}

/// GitHub commit representation (only the identity is needed for counting)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubCommit {
    pub sha: String,
}

/// GitHub pull request representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubPullRequest {
    pub number: i64,
    pub state: String,
    pub user: Option<GithubUser>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub assignees: Vec<GithubUser>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub requested_reviewers: Vec<GithubUser>,
}

impl GithubPullRequest {
    /// A pull request is relevant to a user who authored it, is assigned to
    /// it, or is a requested reviewer on it.
    pub fn involves(&self, username: &str) -> bool {
        self.user.as_ref().is_some_and(|u| u.login == username)
            || self.assignees.iter().any(|a| a.login == username)
            || self.requested_reviewers.iter().any(|r| r.login == username)
    }
}

/// Weekly bucket in the contributor statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorWeek {
    /// Week start (unix seconds)
    pub w: i64,
    /// Additions
    pub a: i64,
    /// Deletions
    pub d: i64,
    /// Commits
    pub c: i64,
}

/// One contributor's entry in the contributor statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributorStats {
    pub author: Option<GithubUser>,
    pub total: i64,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub weeks: Vec<ContributorWeek>,
}

impl ContributorStats {
    /// Net lines (additions minus deletions) across all weeks
    pub fn net_lines(&self) -> i64 {
        self.weeks.iter().map(|week| week.a - week.d).sum()
    }
}

/// Outcome of one contributor statistics request
#[derive(Debug, Clone)]
pub enum ContributorStatsResponse {
    /// 200: statistics are available
    Ready(Vec<ContributorStats>),
    /// 202: GitHub is still computing the statistics
    Computing,
    /// Any other status
    Unavailable { status: u16 },
}

/// Port trait for GitHub API operations
#[async_trait]
pub trait GithubClient: Send + Sync {
    /// List one page of repositories visible to the token's account
    async fn list_repos_page(&self, token: &str, page: u32)
        -> Result<Vec<GithubRepo>, GithubError>;

    /// List one page of commits in a repository authored by `author`
    async fn list_commits_page(
        &self,
        token: &str,
        repo: &GithubRepo,
        author: &str,
        page: u32,
    ) -> Result<Vec<GithubCommit>, GithubError>;

    /// List one page of pull requests (any state) in a repository
    async fn list_pulls_page(
        &self,
        token: &str,
        repo: &GithubRepo,
        author: &str,
        page: u32,
    ) -> Result<Vec<GithubPullRequest>, GithubError>;

    /// Request the contributor statistics of a repository once
    async fn get_contributor_stats(
        &self,
        token: &str,
        repo: &GithubRepo,
    ) -> Result<ContributorStatsResponse, GithubError>;
}
