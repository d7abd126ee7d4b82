//! ghpulse server
//!
//! Periodically collects GitHub activity metrics for a set of accounts,
//! merges them into one aggregate, caches it and pushes every new aggregate
//! to connected websocket clients.
//! Uses hexagonal (ports & adapters) architecture for clean separation of concerns.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Router};
use sea_orm::Database;
use tokio_util::sync::CancellationToken;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::GovernorLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod adapters;
mod app;
mod config;
mod domain;
mod entity;
mod error;
mod handlers;
mod logging;

#[cfg(test)]
mod test_utils;


use adapters::{GithubClientImpl, JsonFileStore, PostgresStore};
use app::{
    AccountAggregator, Broadcaster, CollectionJob, JobScheduler, MergedMetricsJob, MetricFetcher,
    ResultCache,
};
use config::Config;
use domain::entities::AccountCredentials;
use domain::ports::KeyValueStore;
use error::SchedulerError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Arc<Broadcaster>,
    pub cache: Arc<ResultCache<dyn KeyValueStore>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;
    let _log_guard = logging::init_logging(config.log_dir.as_deref());

    tracing::info!("Starting ghpulse...");

    let store = open_store(&config).await?;
    store.load().await.context("Failed to load store")?;
    tracing::info!("Store loaded");

    let cache: Arc<ResultCache<dyn KeyValueStore>> = Arc::new(ResultCache::new(store.clone()));
    let broadcaster = Arc::new(Broadcaster::new());
    let broadcaster_cancel = CancellationToken::new();

    // A collection setup failure disables collection only; the cached
    // aggregate is still served.
    let scheduler = match start_collection(
        &config,
        store.clone(),
        cache.clone(),
        &broadcaster,
        broadcaster_cancel.clone(),
    ) {
        Ok(scheduler) => Some(scheduler),
        Err(e) => {
            tracing::error!(error = %e, "Metrics collection disabled");
            None
        }
    };

    let state = AppState {
        broadcaster,
        cache,
    };

    // Rate limiting for websocket upgrades: 2 req/sec sustained, burst of 5
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(2)
            .burst_size(5)
            .finish()
            .context("Failed to build governor config")?,
    );

    let ws_routes = Router::new()
        .route("/ws", get(handlers::ws_handler))
        .layer(GovernorLayer {
            config: governor_config,
        });

    let app = handlers::router()
        .merge(ws_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("Shutting down...");
    if let Some(scheduler) = &scheduler {
        scheduler.stop();
    }
    broadcaster_cancel.cancel();
    if let Err(e) = store.flush().await {
        tracing::error!(error = %e, "Failed to flush store");
    }

    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let db = Database::connect(url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Database connected");
            Ok(Arc::new(PostgresStore::new(db)))
        }
        None => {
            tracing::info!(path = %config.store_file, "Using JSON file store");
            Ok(Arc::new(JsonFileStore::new(&config.store_file)))
        }
    }
}

/// Build and start the scheduler, wiring its events into the broadcaster
fn start_collection(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    cache: Arc<ResultCache<dyn KeyValueStore>>,
    broadcaster: &Arc<Broadcaster>,
    cancel: CancellationToken,
) -> anyhow::Result<JobScheduler> {
    let accounts = config.accounts.clone()?;
    let interval = config.poll_interval.clone()?;

    let scheduler = build_scheduler(config, accounts, interval, store, cache)?;
    broadcaster.spawn(scheduler.subscribe(), cancel);
    scheduler.start()?;

    Ok(scheduler)
}

fn build_scheduler(
    config: &Config,
    accounts: Vec<AccountCredentials>,
    interval: Duration,
    store: Arc<dyn KeyValueStore>,
    cache: Arc<ResultCache<dyn KeyValueStore>>,
) -> Result<JobScheduler, SchedulerError> {
    tracing::info!(accounts = accounts.len(), "Configuring metrics collection");

    let github = Arc::new(GithubClientImpl::new(config.github_api_url.clone()));
    let fetcher =
        MetricFetcher::new(github.clone(), store).with_stats_poll_delay(config.stats_poll_delay);
    let aggregator = Arc::new(AccountAggregator::new(github, fetcher));

    let job = MergedMetricsJob::new("github-metrics", accounts, aggregator, cache)
        .with_mode(config.account_collection);
    let jobs: Vec<Arc<dyn CollectionJob>> = vec![Arc::new(job)];

    Ok(JobScheduler::new(jobs, interval)?.with_overlap(config.tick_overlap))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
