//! Metrics snapshot entity
//!
//! A snapshot is one complete set of the four tracked activity metrics.
//! Snapshots are values: a collection pass builds a new one and the next pass
//! supersedes it, nothing mutates a published snapshot.

use std::iter::Sum;
use std::ops::Add;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregated activity metrics for one or more accounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub commits: u64,
    #[serde(rename = "mergedPRs")]
    pub merged_prs: u64,
    /// Net additions minus deletions, may be negative
    #[serde(rename = "linesOfCodeWritten")]
    pub lines_of_code_written: i64,
    #[serde(rename = "repositoriesContributed")]
    pub repositories_contributed: u64,
}

impl MetricsSnapshot {
    /// The zero snapshot
    pub fn zero() -> Self {
        Self::default()
    }

    /// Field-wise sum of any number of snapshots.
    ///
    /// An empty input yields the zero snapshot.
    pub fn merge<I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = MetricsSnapshot>,
    {
        snapshots.into_iter().sum()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

impl Add for MetricsSnapshot {
    type Output = MetricsSnapshot;

    fn add(self, rhs: MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            commits: self.commits + rhs.commits,
            merged_prs: self.merged_prs + rhs.merged_prs,
            lines_of_code_written: self.lines_of_code_written + rhs.lines_of_code_written,
            repositories_contributed: self.repositories_contributed
                + rhs.repositories_contributed,
        }
    }
}

impl Sum for MetricsSnapshot {
    fn sum<I: Iterator<Item = MetricsSnapshot>>(iter: I) -> Self {
        iter.fold(MetricsSnapshot::zero(), Add::add)
    }
}

/// The latest published snapshot together with its publication time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedMetrics {
    pub metrics: MetricsSnapshot,
    pub updated_at: DateTime<Utc>,
}
