//! Per-Account Aggregator
//!
//! Builds one `MetricsSnapshot` for one account: lists every repository the
//! account can see, then computes the four metrics concurrently.

use std::sync::Arc;

use crate::app::MetricFetcher;
use crate::domain::entities::{AccountCredentials, MetricKind, MetricsSnapshot};
use crate::domain::ports::{GithubClient, GithubRepo, KeyValueStore, PER_PAGE};
use crate::error::GithubError;

pub struct AccountAggregator<GC, S>
where
    GC: GithubClient,
    S: KeyValueStore + ?Sized,
{
    github: Arc<GC>,
    fetcher: MetricFetcher<GC, S>,
}

impl<GC, S> AccountAggregator<GC, S>
where
    GC: GithubClient,
    S: KeyValueStore + ?Sized,
{
    pub fn new(github: Arc<GC>, fetcher: MetricFetcher<GC, S>) -> Self {
        Self { github, fetcher }
    }

    /// Collect the account's snapshot.
    ///
    /// A failed repository listing yields the zero snapshot so that merging
    /// several accounts degrades instead of failing.
    pub async fn collect(&self, account: &AccountCredentials) -> MetricsSnapshot {
        tracing::debug!(account = %account.username, "Fetching user repos");

        let repos = match self.list_repositories(account).await {
            Ok(repos) => repos,
            Err(e) => {
                tracing::error!(
                    account = %account.username,
                    error = %e,
                    "Error listing repositories, account contributes nothing"
                );
                return MetricsSnapshot::zero();
            }
        };

        let (commits, merged_prs, lines_of_code_written) = tokio::join!(
            self.total(account, &repos, MetricKind::Commits),
            self.total(account, &repos, MetricKind::PullRequests),
            self.total(account, &repos, MetricKind::LinesOfCode),
        );

        let snapshot = MetricsSnapshot {
            commits: commits as u64,
            merged_prs: merged_prs as u64,
            lines_of_code_written,
            repositories_contributed: repos.len() as u64,
        };

        tracing::info!(
            account = %account.username,
            repos = repos.len(),
            commits = snapshot.commits,
            merged_prs = snapshot.merged_prs,
            lines = snapshot.lines_of_code_written,
            "Collected account metrics"
        );

        snapshot
    }

    /// Every repository visible to the account, following full pages
    pub async fn list_repositories(
        &self,
        account: &AccountCredentials,
    ) -> Result<Vec<GithubRepo>, GithubError> {
        let mut repos = Vec::new();
        let mut page = 0;

        loop {
            page += 1;
            let batch = self.github.list_repos_page(&account.token, page).await?;
            let full = batch.len() == PER_PAGE;
            repos.extend(batch);

            if !full {
                return Ok(repos);
            }
        }
    }

    /// Sum one metric over the repositories, one repository at a time
    async fn total(
        &self,
        account: &AccountCredentials,
        repos: &[GithubRepo],
        kind: MetricKind,
    ) -> i64 {
        let mut total = 0;
        for repo in repos {
            total += self.fetcher.fetch_count(account, repo, kind).await;
        }
        total
    }
}
