//! Page cursor entity
//!
//! Resumption state for one paginated fetch dimension, keyed by
//! (account, repository, metric kind).

use serde::{Deserialize, Serialize};

/// The metrics the fetcher knows how to compute for one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Commits,
    PullRequests,
    LinesOfCode,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Commits => "commits",
            MetricKind::PullRequests => "pull_requests",
            MetricKind::LinesOfCode => "lines_of_code",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted page state for one (account, repository, metric kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCursor {
    /// Last page reached by the previous pass (>= 1)
    pub last_page_number: u32,
    /// Pull requests only: relevant items counted over all pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_total_relevant_count: Option<u64>,
    /// Pull requests only: relevant items counted on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_page_relevant_count: Option<u64>,
}

impl PageCursor {
    pub fn commits(last_page_number: u32) -> Self {
        Self {
            last_page_number: last_page_number.max(1),
            last_total_relevant_count: None,
            last_page_relevant_count: None,
        }
    }

    pub fn pull_requests(last_page_number: u32, total: u64, last_page: u64) -> Self {
        Self {
            last_page_number: last_page_number.max(1),
            last_total_relevant_count: Some(total),
            last_page_relevant_count: Some(last_page),
        }
    }

    /// Page counter to resume from: one before the stored last page, so the
    /// next increment re-requests that page.
    pub fn resume_page_counter(&self) -> u32 {
        self.last_page_number.saturating_sub(1)
    }

    /// Relevant count carried over from pages before the stored last page
    pub fn carried_relevant_count(&self) -> u64 {
        self.last_total_relevant_count
            .unwrap_or(0)
            .saturating_sub(self.last_page_relevant_count.unwrap_or(0))
    }
}

/// Storage key for a cursor. Namespaced so concurrent jobs never collide.
pub fn cursor_key(account: &str, repo_full_name: &str, kind: MetricKind) -> String {
    format!("cursor:{}:{}:{}", account, repo_full_name, kind)
}
