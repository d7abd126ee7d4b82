//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::app::CollectionJob;
use crate::domain::entities::{MetricKind, MetricsSnapshot};
use crate::domain::ports::{
    ContributorStats, ContributorStatsResponse, GithubClient, GithubCommit, GithubPullRequest,
    GithubRepo, KeyValueStore, Listener, ListenerId,
};
use crate::error::{GithubError, ListenerError, StoreError};
use crate::test_utils::fixtures::test_commit;

// ============================================================================
// In-Memory Key-Value Store
// ============================================================================

#[derive(Default)]
pub struct InMemoryStore {
    values: Arc<RwLock<HashMap<String, Value>>>,
    puts: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a key for testing
    pub fn with_value(self, key: &str, value: Value) -> Self {
        self.values.write().unwrap().insert(key.to_string(), value);
        self
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.read().unwrap().get(key).cloned()
    }

    /// Number of `put` calls; `with_value` seeding is not counted
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn load(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.read().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.values.write().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A store whose backend is unreachable
#[derive(Default)]
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn load(&self) -> Result<(), StoreError> {
        Err(StoreError::Database("store unavailable".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Database("store unavailable".to_string()))
    }

    async fn put(&self, _key: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Database("store unavailable".to_string()))
    }

    async fn flush(&self) -> Result<(), StoreError> {
        Err(StoreError::Database("store unavailable".to_string()))
    }
}

// ============================================================================
// Mock GitHub Client
// ============================================================================

/// One recorded page request: (repo full name, metric kind, page)
pub type PageRequest = (String, MetricKind, u32);

/// Scripted contributor statistics reply; `None` is a transport error
pub type StatsReply = Option<ContributorStatsResponse>;

#[derive(Default)]
pub struct MockGithubClient {
    /// Repositories visible per token
    repos: Arc<RwLock<HashMap<String, Vec<GithubRepo>>>>,
    /// Tokens whose repository listing fails
    failing_tokens: Arc<RwLock<HashSet<String>>>,
    /// Commit page sizes per repo (index 0 = page 1)
    commit_pages: Arc<RwLock<HashMap<String, Vec<usize>>>>,
    /// Pull request pages per repo (index 0 = page 1)
    pull_pages: Arc<RwLock<HashMap<String, Vec<Vec<GithubPullRequest>>>>>,
    /// Pages that fail with an API error
    failing_pages: Arc<RwLock<HashSet<PageRequest>>>,
    /// Scripted contributor statistics replies per repo; the last one repeats
    stats: Arc<RwLock<HashMap<String, VecDeque<StatsReply>>>>,
    /// Every page requested, in order
    pub requests: Arc<RwLock<Vec<PageRequest>>>,
    /// Time of every contributor statistics request
    pub stats_polls: Arc<RwLock<Vec<tokio::time::Instant>>>,
}

impl MockGithubClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the repositories visible to a token
    pub fn with_repos(self, token: &str, repos: Vec<GithubRepo>) -> Self {
        self.repos.write().unwrap().insert(token.to_string(), repos);
        self
    }

    /// Make repository listing fail for a token
    pub fn with_failing_repo_listing(self, token: &str) -> Self {
        self.failing_tokens.write().unwrap().insert(token.to_string());
        self
    }

    /// Configure commit page sizes for a repo
    pub fn with_commit_pages(self, repo: &str, pages: Vec<usize>) -> Self {
        self.commit_pages
            .write()
            .unwrap()
            .insert(repo.to_string(), pages);
        self
    }

    /// Configure pull request pages for a repo
    pub fn with_pull_pages(self, repo: &str, pages: Vec<Vec<GithubPullRequest>>) -> Self {
        self.pull_pages.write().unwrap().insert(repo.to_string(), pages);
        self
    }

    /// Make one page request fail
    pub fn with_failing_page(self, repo: &str, kind: MetricKind, page: u32) -> Self {
        self.failing_pages
            .write()
            .unwrap()
            .insert((repo.to_string(), kind, page));
        self
    }

    /// Script contributor statistics replies for a repo
    pub fn with_stats_replies(self, repo: &str, replies: Vec<StatsReply>) -> Self {
        self.stats
            .write()
            .unwrap()
            .insert(repo.to_string(), replies.into());
        self
    }

    /// Configure ready contributor statistics for a repo
    pub fn with_stats(self, repo: &str, stats: Vec<ContributorStats>) -> Self {
        self.with_stats_replies(repo, vec![Some(ContributorStatsResponse::Ready(stats))])
    }

    /// Pages requested for a repo and metric, in order
    pub fn pages_requested(&self, repo: &str, kind: MetricKind) -> Vec<u32> {
        self.requests
            .read()
            .unwrap()
            .iter()
            .filter(|(r, k, _)| r == repo && *k == kind)
            .map(|(_, _, page)| *page)
            .collect()
    }

    fn record(&self, repo: &GithubRepo, kind: MetricKind, page: u32) -> Result<(), GithubError> {
        let request = (repo.full_name.clone(), kind, page);
        self.requests.write().unwrap().push(request.clone());

        if self.failing_pages.read().unwrap().contains(&request) {
            return Err(GithubError::Api {
                status: 500,
                message: "Mock failure".to_string(),
            });
        }
        Ok(())
    }
}

fn page_of<T: Clone>(pages: Option<&Vec<T>>, page: u32) -> Option<T> {
    pages.and_then(|pages| pages.get(page as usize - 1)).cloned()
}

#[async_trait]
impl GithubClient for MockGithubClient {
    async fn list_repos_page(
        &self,
        token: &str,
        page: u32,
    ) -> Result<Vec<GithubRepo>, GithubError> {
        if self.failing_tokens.read().unwrap().contains(token) {
            return Err(GithubError::Unauthorized);
        }

        let repos = self.repos.read().unwrap();
        let all = repos.get(token).cloned().unwrap_or_default();
        Ok(all
            .chunks(crate::domain::ports::PER_PAGE)
            .nth(page as usize - 1)
            .map(|chunk| chunk.to_vec())
            .unwrap_or_default())
    }

    async fn list_commits_page(
        &self,
        _token: &str,
        repo: &GithubRepo,
        _author: &str,
        page: u32,
    ) -> Result<Vec<GithubCommit>, GithubError> {
        self.record(repo, MetricKind::Commits, page)?;

        let pages = self.commit_pages.read().unwrap();
        let size = page_of(pages.get(&repo.full_name), page).unwrap_or(0);
        Ok((0..size).map(|i| test_commit(page, i)).collect())
    }

    async fn list_pulls_page(
        &self,
        _token: &str,
        repo: &GithubRepo,
        _author: &str,
        page: u32,
    ) -> Result<Vec<GithubPullRequest>, GithubError> {
        self.record(repo, MetricKind::PullRequests, page)?;

        let pages = self.pull_pages.read().unwrap();
        Ok(page_of(pages.get(&repo.full_name), page).unwrap_or_default())
    }

    async fn get_contributor_stats(
        &self,
        _token: &str,
        repo: &GithubRepo,
    ) -> Result<ContributorStatsResponse, GithubError> {
        self.stats_polls
            .write()
            .unwrap()
            .push(tokio::time::Instant::now());

        let reply = {
            let mut stats = self.stats.write().unwrap();
            match stats.get_mut(&repo.full_name) {
                Some(replies) if replies.len() > 1 => replies.pop_front().flatten(),
                Some(replies) => replies.front().cloned().flatten(),
                None => Some(ContributorStatsResponse::Ready(Vec::new())),
            }
        };

        reply.ok_or_else(|| GithubError::Api {
            status: 502,
            message: "Mock transport failure".to_string(),
        })
    }
}

// ============================================================================
// Recording Listener
// ============================================================================

pub struct RecordingListener {
    id: ListenerId,
    open: AtomicBool,
    fail_sends: AtomicBool,
    pub received: Mutex<Vec<String>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self {
            id: ListenerId::new(),
            open: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
            received: Mutex::new(Vec::new()),
        }
    }

    /// A listener whose connection already reports closed
    pub fn closed() -> Self {
        let listener = Self::new();
        listener.open.store(false, Ordering::SeqCst);
        listener
    }

    /// A listener that reports open but whose sends fail
    pub fn failing() -> Self {
        let listener = Self::new();
        listener.fail_sends.store(true, Ordering::SeqCst);
        listener
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Listener for RecordingListener {
    fn id(&self) -> ListenerId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn send(&self, payload: &str) -> Result<(), ListenerError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ListenerError::Send("Mock failure".to_string()));
        }
        self.received.lock().unwrap().push(payload.to_string());
        Ok(())
    }
}

// ============================================================================
// Counting Collection Job
// ============================================================================

/// A job that counts its runs and reports the run number as `commits`
pub struct CountingJob {
    name: String,
    pub runs: Arc<AtomicUsize>,
    duration: Duration,
}

impl CountingJob {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            runs: Arc::new(AtomicUsize::new(0)),
            duration: Duration::ZERO,
        }
    }

    /// Make every run take `duration` (tokio time) before completing
    pub fn taking(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CollectionJob for CountingJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> MetricsSnapshot {
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.duration.is_zero() {
            tokio::time::sleep(self.duration).await;
        }
        MetricsSnapshot {
            commits: run as u64,
            ..MetricsSnapshot::zero()
        }
    }
}
