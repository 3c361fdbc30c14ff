//! ledger_pipeline - account-side event pipeline
//!
//! Runs the balance projector on `transaction.events` and the account
//! activity projector on `account.events`, with a health endpoint reporting
//! both consumers.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_pipeline::api::{self, HealthState};
use ledger_pipeline::cache::{CacheStore, RedisCache};
use ledger_pipeline::db;
use ledger_pipeline::domain::Topic;
use ledger_pipeline::event_log::{Consumer, ConsumerError, EventLog, Publisher, RedisEventLog};
use ledger_pipeline::idempotency::ProcessedTransactions;
use ledger_pipeline::projection::{AccountActivityProjector, BalanceProjector};
use ledger_pipeline::read_model::{AccountReadRepository, CachedAccountCounter};
use ledger_pipeline::store::{AccountStore, PgAccountStore};
use ledger_pipeline::Config;

/// Group of the account side on the transaction topic
const BALANCE_GROUP: &str = "account-service-group";

/// Group of the user side on the account topic
const ACTIVITY_GROUP: &str = "user-service-group";

/// Initialize tracing/logging
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ledger_pipeline=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_json);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!(environment = %config.environment, "Starting ledger_pipeline");
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    db::verify_connection(&pool).await?;
    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }
    tracing::info!("Database connected successfully");

    tracing::info!("Connecting to Redis...");
    let cache: Arc<dyn CacheStore> = Arc::new(RedisCache::connect(&config.redis_url).await?);
    let publish_log: Arc<dyn EventLog> =
        Arc::new(RedisEventLog::connect(&config.redis_url).await?);
    let publisher = Publisher::new(publish_log);

    // Wiring
    let accounts: Arc<dyn AccountStore> = Arc::new(PgAccountStore::new(pool.clone()));
    let balance_projector = BalanceProjector::new(
        accounts.clone(),
        AccountReadRepository::new(accounts, cache.clone()),
        ProcessedTransactions::new(cache.clone(), config.idempotency_ttl),
        publisher,
    );
    let activity_projector = AccountActivityProjector::new(CachedAccountCounter::new(cache));

    // Each consumer blocks on its own log connection
    let balance_consumer = Consumer::new(
        Arc::new(RedisEventLog::connect(&config.redis_url).await?),
        Arc::new(balance_projector),
        config.consumer(Topic::TransactionEvents, BALANCE_GROUP),
    );
    let activity_consumer = Consumer::new(
        Arc::new(RedisEventLog::connect(&config.redis_url).await?),
        Arc::new(activity_projector),
        config.consumer(Topic::AccountEvents, ACTIVITY_GROUP),
    );

    let health = HealthState::new()
        .with_consumer("balance-projector", balance_consumer.state())
        .with_consumer("account-activity-projector", activity_consumer.state());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut consumers = JoinSet::new();
    consumers.spawn(balance_consumer.run(shutdown_rx.clone()));
    consumers.spawn(activity_consumer.run(shutdown_rx.clone()));

    let app = api::create_router(health).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let server = {
        let mut stop = shutdown_rx.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop.wait_for(|stopped| *stopped).await;
                })
                .await
        })
    };

    // A consumer that exits before shutdown was asked for is fatal
    let early_exit = tokio::select! {
        _ = shutdown_signal() => None,
        Some(joined) = consumers.join_next() => Some(joined),
    };

    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(true);

    while let Some(joined) = consumers.join_next().await {
        log_consumer_exit(joined);
    }
    server.await??;

    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    if let Some(joined) = early_exit {
        log_consumer_exit(joined);
        return Err(anyhow::anyhow!("Consumer stopped before shutdown"));
    }

    Ok(())
}

fn log_consumer_exit(joined: Result<Result<(), ConsumerError>, JoinError>) {
    match joined {
        Ok(Err(ConsumerError::Cancelled)) | Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "Consumer failed"),
        Err(e) => tracing::error!(error = %e, "Consumer task panicked"),
    }
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
