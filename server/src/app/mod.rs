//! Application layer
//!
//! The collection engine: fetch, aggregate, merge, cache, schedule, broadcast.
//! Everything here is generic over the domain ports so it runs unchanged
//! against mocks in tests.

pub mod account_aggregator;
pub mod broadcaster;
pub mod collection_job;
pub mod cursor_store;
pub mod metric_fetcher;
pub mod result_cache;
pub mod scheduler;

pub use account_aggregator::AccountAggregator;
pub use broadcaster::{render_payload, Broadcaster};
pub use collection_job::{AccountCollection, CollectionJob, MergedMetricsJob};
pub use cursor_store::CursorStore;
pub use metric_fetcher::{MetricFetcher, DEFAULT_STATS_POLL_DELAY};
pub use result_cache::ResultCache;
pub use scheduler::{JobCompleted, JobScheduler, TickOverlap, DEFAULT_INTERVAL};
