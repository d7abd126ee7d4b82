//! Domain ports (traits)
//!
//! Port traits define interfaces that the domain layer requires.
//! Adapters provide concrete implementations of these traits.

pub mod github;
pub mod listener;
pub mod store;

pub use github::{
    ContributorStats, ContributorStatsResponse, GithubClient, GithubCommit, GithubPullRequest,
    GithubRepo, PER_PAGE,
};
pub use listener::{Listener, ListenerId};
pub use store::KeyValueStore;
