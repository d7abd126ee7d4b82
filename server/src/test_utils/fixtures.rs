//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.

use crate::domain::entities::AccountCredentials;
use crate::domain::ports::github::{
    ContributorStats, ContributorWeek, GithubCommit, GithubPullRequest, GithubRepo, GithubUser,
};

/// Create a test account
pub fn test_account() -> AccountCredentials {
    AccountCredentials::new("octocat", "token-octocat")
}

/// Create a test account with a specific username (token is derived from it)
pub fn test_account_named(username: &str) -> AccountCredentials {
    AccountCredentials::new(username, format!("token-{}", username))
}

pub fn test_user(login: &str) -> GithubUser {
    GithubUser {
        login: login.to_string(),
    }
}

/// Create a test repository owned by `owner`
pub fn test_repo(owner: &str, name: &str) -> GithubRepo {
    GithubRepo {
        id: 1,
        name: name.to_string(),
        full_name: format!("{}/{}", owner, name),
        owner: test_user(owner),
    }
}

/// Create `count` distinct repositories owned by `owner`
pub fn test_repos(owner: &str, count: usize) -> Vec<GithubRepo> {
    (0..count)
        .map(|i| GithubRepo {
            id: i as i64,
            ..test_repo(owner, &format!("repo-{}", i))
        })
        .collect()
}

pub fn test_commit(page: u32, index: usize) -> GithubCommit {
    GithubCommit {
        sha: format!("{:04}{:04}", page, index),
    }
}

/// A pull request authored by `author`
pub fn test_pr_by(author: &str) -> GithubPullRequest {
    GithubPullRequest {
        number: 1,
        state: "closed".to_string(),
        user: Some(test_user(author)),
        assignees: Vec::new(),
        requested_reviewers: Vec::new(),
    }
}

/// A pull request by `author` with the given assignees and requested reviewers
pub fn test_pr_with(author: &str, assignees: &[&str], reviewers: &[&str]) -> GithubPullRequest {
    GithubPullRequest {
        assignees: assignees.iter().map(|a| test_user(a)).collect(),
        requested_reviewers: reviewers.iter().map(|r| test_user(r)).collect(),
        ..test_pr_by(author)
    }
}

/// A page of `relevant` pull requests by `user` padded to `total` with unrelated ones
pub fn test_pr_page(user: &str, relevant: usize, total: usize) -> Vec<GithubPullRequest> {
    (0..total)
        .map(|i| {
            if i < relevant {
                test_pr_by(user)
            } else {
                test_pr_by("someone-else")
            }
        })
        .collect()
}

/// Contributor statistics entry with one week per (additions, deletions) pair
pub fn test_contributor(login: &str, weeks: &[(i64, i64)]) -> ContributorStats {
    ContributorStats {
        author: Some(test_user(login)),
        total: weeks.len() as i64,
        weeks: weeks
            .iter()
            .enumerate()
            .map(|(i, (a, d))| ContributorWeek {
                w: i as i64 * 604_800,
                a: *a,
                d: *d,
                c: 1,
            })
            .collect(),
    }
}
