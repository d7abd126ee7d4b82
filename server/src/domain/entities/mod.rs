//! Domain entities
//!
//! Pure domain models representing core business concepts.
//! These are separate from the SeaORM entities in the `entity` module.

pub mod account;
pub mod cursor;
pub mod metrics;

pub use account::AccountCredentials;
pub use cursor::{MetricKind, PageCursor};
pub use metrics::{CachedMetrics, MetricsSnapshot};
