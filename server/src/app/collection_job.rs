//! Collection jobs
//!
//! A job is one zero-argument unit of scheduled work that produces a
//! snapshot. `MergedMetricsJob` is the production pipeline: collect every
//! configured account, merge, publish to the result cache.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::app::{AccountAggregator, ResultCache};
use crate::domain::entities::{AccountCredentials, MetricsSnapshot};
use crate::domain::ports::{GithubClient, KeyValueStore};

/// Port for work the scheduler runs on every tick
#[async_trait]
pub trait CollectionJob: Send + Sync {
    fn name(&self) -> &str;

    /// Run the job once. Jobs recover their own errors into the snapshot.
    async fn run(&self) -> MetricsSnapshot;
}

/// How the accounts of one job are collected relative to each other
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccountCollection {
    /// One account after another (gentler on the API rate limit)
    #[default]
    Sequential,
    /// All accounts at once
    Concurrent,
}

impl FromStr for AccountCollection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(AccountCollection::Sequential),
            "concurrent" => Ok(AccountCollection::Concurrent),
            _ => Err(format!("Unknown account collection mode: {}", s)),
        }
    }
}

/// Collects several accounts, merges them and publishes the aggregate
pub struct MergedMetricsJob<GC, S>
where
    GC: GithubClient + 'static,
    S: KeyValueStore + ?Sized + 'static,
{
    name: String,
    accounts: Vec<AccountCredentials>,
    aggregator: Arc<AccountAggregator<GC, S>>,
    cache: Arc<ResultCache<S>>,
    mode: AccountCollection,
}

impl<GC, S> MergedMetricsJob<GC, S>
where
    GC: GithubClient + 'static,
    S: KeyValueStore + ?Sized + 'static,
{
    pub fn new(
        name: impl Into<String>,
        accounts: Vec<AccountCredentials>,
        aggregator: Arc<AccountAggregator<GC, S>>,
        cache: Arc<ResultCache<S>>,
    ) -> Self {
        Self {
            name: name.into(),
            accounts,
            aggregator,
            cache,
            mode: AccountCollection::default(),
        }
    }

    pub fn with_mode(mut self, mode: AccountCollection) -> Self {
        self.mode = mode;
        self
    }

    async fn collect_sequential(&self) -> Vec<MetricsSnapshot> {
        let mut snapshots = Vec::with_capacity(self.accounts.len());
        for account in &self.accounts {
            snapshots.push(self.aggregator.collect(account).await);
        }
        snapshots
    }

    async fn collect_concurrent(&self) -> Vec<MetricsSnapshot> {
        let mut tasks = JoinSet::new();
        for account in self.accounts.iter().cloned() {
            let aggregator = self.aggregator.clone();
            tasks.spawn(async move { aggregator.collect(&account).await });
        }

        let mut snapshots = Vec::with_capacity(self.accounts.len());
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => {
                    tracing::error!(job = %self.name, error = %e, "Account collection task failed")
                }
            }
        }
        snapshots
    }
}

#[async_trait]
impl<GC, S> CollectionJob for MergedMetricsJob<GC, S>
where
    GC: GithubClient + 'static,
    S: KeyValueStore + ?Sized + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> MetricsSnapshot {
        let snapshots = match self.mode {
            AccountCollection::Sequential => self.collect_sequential().await,
            AccountCollection::Concurrent => self.collect_concurrent().await,
        };

        let merged = MetricsSnapshot::merge(snapshots);
        if merged.is_zero() && !self.accounts.is_empty() {
            tracing::warn!(job = %self.name, "Every account contributed an empty snapshot");
        }
        self.cache.publish(merged).await;

        tracing::info!(
            job = %self.name,
            accounts = self.accounts.len(),
            commits = merged.commits,
            merged_prs = merged.merged_prs,
            lines = merged.lines_of_code_written,
            repos = merged.repositories_contributed,
            "Published merged metrics"
        );

        merged
    }
}
