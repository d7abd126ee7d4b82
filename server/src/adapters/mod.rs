//! Adapters layer
//!
//! Implementations of port traits for external systems.

pub mod github;
pub mod store;
pub mod websocket;

pub use github::GithubClientImpl;
pub use store::{JsonFileStore, PostgresStore};
pub use websocket::WsListener;
