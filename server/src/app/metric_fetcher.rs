//! Paginated Metric Fetcher
//!
//! Computes one metric for one repository under one account.
//!
//! Commits and pull requests are walked page by page (100 items each) and
//! resumed from the stored page cursor: the previous pass's last page is
//! always re-requested because items may have landed on it since. Walking
//! stops at the first page that is not full.
//!
//! Errors never escape: a failed page counts as an empty page, which also
//! ends the walk. Lines of code come from the contributor statistics
//! endpoint, which answers 202 while GitHub computes them; that endpoint is
//! polled on a fixed delay until it settles.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use crate::app::CursorStore;
use crate::domain::entities::{AccountCredentials, MetricKind, PageCursor};
use crate::domain::ports::{
    ContributorStats, ContributorStatsResponse, GithubClient, GithubRepo, KeyValueStore,
    PER_PAGE,
};

/// Delay between contributor statistics polls while GitHub answers 202
pub const DEFAULT_STATS_POLL_DELAY: Duration = Duration::from_secs(5);

const MIN_STATS_POLL_DELAY: Duration = Duration::from_millis(1);

pub struct MetricFetcher<GC, S>
where
    GC: GithubClient,
    S: KeyValueStore + ?Sized,
{
    github: Arc<GC>,
    cursors: CursorStore<S>,
    stats_poll_delay: Duration,
}

impl<GC, S> MetricFetcher<GC, S>
where
    GC: GithubClient,
    S: KeyValueStore + ?Sized,
{
    pub fn new(github: Arc<GC>, store: Arc<S>) -> Self {
        Self {
            github,
            cursors: CursorStore::new(store),
            stats_poll_delay: DEFAULT_STATS_POLL_DELAY,
        }
    }

    /// Override the poll delay; a zero delay is raised to 1ms
    pub fn with_stats_poll_delay(mut self, delay: Duration) -> Self {
        self.stats_poll_delay = delay.max(MIN_STATS_POLL_DELAY);
        self
    }

    /// Count one metric for one repository, updating its cursor when paginated
    pub async fn fetch_count(
        &self,
        account: &AccountCredentials,
        repo: &GithubRepo,
        kind: MetricKind,
    ) -> i64 {
        match kind {
            MetricKind::Commits => self.fetch_commit_count(account, repo).await as i64,
            MetricKind::PullRequests => self.fetch_pull_request_count(account, repo).await as i64,
            MetricKind::LinesOfCode => self.fetch_lines_of_code(account, repo).await,
        }
    }

    /// Commits authored by the account in `repo`.
    ///
    /// The listing is already filtered by author, so the total is
    /// `100 * (last_page - 1) + items_on_last_page`.
    pub async fn fetch_commit_count(&self, account: &AccountCredentials, repo: &GithubRepo) -> u64 {
        let cursor = self
            .cursors
            .load(&account.username, &repo.full_name, MetricKind::Commits)
            .await;
        let mut page = cursor.map_or(0, |c| c.resume_page_counter());

        let on_last_page = loop {
            page += 1;
            tracing::debug!(repo = %repo.full_name, page, "Fetching commits");

            let on_page = match self
                .github
                .list_commits_page(&account.token, repo, &account.username, page)
                .await
            {
                Ok(commits) => commits.len(),
                Err(e) => {
                    tracing::warn!(
                        account = %account.username,
                        repo = %repo.full_name,
                        page,
                        error = %e,
                        "Error getting commit page, counting it as empty"
                    );
                    0
                }
            };

            if on_page != PER_PAGE {
                break on_page;
            }
        };

        self.cursors
            .save(
                &account.username,
                &repo.full_name,
                MetricKind::Commits,
                PageCursor::commits(page),
            )
            .await;

        (PER_PAGE * (page as usize - 1) + on_last_page) as u64
    }

    /// Pull requests in `repo` the account authored, is assigned to, or was
    /// asked to review.
    ///
    /// Relevance is decided per item, so the walk is driven by the raw page
    /// length and the running total is carried in the cursor.
    pub async fn fetch_pull_request_count(
        &self,
        account: &AccountCredentials,
        repo: &GithubRepo,
    ) -> u64 {
        let cursor = self
            .cursors
            .load(&account.username, &repo.full_name, MetricKind::PullRequests)
            .await;
        let (mut page, mut total) = cursor.map_or((0, 0), |c| {
            (c.resume_page_counter(), c.carried_relevant_count())
        });

        let relevant_on_last_page = loop {
            page += 1;
            tracing::debug!(repo = %repo.full_name, page, "Fetching pulls");

            let (raw, relevant) = match self
                .github
                .list_pulls_page(&account.token, repo, &account.username, page)
                .await
            {
                Ok(pulls) => {
                    let relevant = pulls
                        .iter()
                        .filter(|pr| pr.involves(&account.username))
                        .count();
                    (pulls.len(), relevant as u64)
                }
                Err(e) => {
                    tracing::warn!(
                        account = %account.username,
                        repo = %repo.full_name,
                        page,
                        error = %e,
                        "Error getting pull request page, counting it as empty"
                    );
                    (0, 0)
                }
            };

            total += relevant;
            if raw != PER_PAGE {
                break relevant;
            }
        };

        self.cursors
            .save(
                &account.username,
                &repo.full_name,
                MetricKind::PullRequests,
                PageCursor::pull_requests(page, total, relevant_on_last_page),
            )
            .await;

        total
    }

    /// Net lines (additions minus deletions) the account wrote in `repo`,
    /// 0 when the account has no contributor entry or statistics are unavailable.
    pub async fn fetch_lines_of_code(&self, account: &AccountCredentials, repo: &GithubRepo) -> i64 {
        let mut ticker: Option<Interval> = None;

        let contributors = loop {
            tracing::debug!(repo = %repo.full_name, "Fetching contribution stats");

            match self.github.get_contributor_stats(&account.token, repo).await {
                Ok(ContributorStatsResponse::Ready(contributors)) => break contributors,
                Ok(ContributorStatsResponse::Computing) => {
                    tracing::debug!(
                        repo = %repo.full_name,
                        delay_ms = self.stats_poll_delay.as_millis() as u64,
                        "Contribution stats still computing"
                    );
                    ticker
                        .get_or_insert_with(|| self.poll_ticker())
                        .tick()
                        .await;
                }
                Ok(ContributorStatsResponse::Unavailable { status }) => {
                    tracing::warn!(
                        repo = %repo.full_name,
                        status,
                        "Contribution stats unavailable"
                    );
                    return 0;
                }
                Err(e) => {
                    tracing::warn!(
                        repo = %repo.full_name,
                        error = %e,
                        "Error getting contribution stats"
                    );
                    return 0;
                }
            }
        };

        contributors
            .iter()
            .find(|c| c.author.as_ref().is_some_and(|a| a.login == account.username))
            .map_or(0, ContributorStats::net_lines)
    }

    fn poll_ticker(&self) -> Interval {
        let mut ticker = interval_at(Instant::now() + self.stats_poll_delay, self.stats_poll_delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
