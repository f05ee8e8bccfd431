//! Schedule Relay
//!
//! Polls for new bulletin revisions, cuts out each group's schedule and
//! pushes it to subscribed chats.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schedule_relay::config::Config;
use schedule_relay::db::{self, DistributionLedger, SubscriberRegistry};
use schedule_relay::groups::GroupRoster;
use schedule_relay::notifier::{Notifier, TelegramSender};
use schedule_relay::pipeline::SchedulePipeline;
use schedule_relay::poller::{HttpDocumentSource, Poller, PollingService};
use schedule_relay::publisher::CloudinaryPublisher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "schedule_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting Schedule Relay v{}", env!("CARGO_PKG_VERSION"));

    let pool = db::create_pool(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database initialized at {}", config.database.url);

    let ledger = DistributionLedger::new(pool.clone());
    let subscribers = SubscriberRegistry::new(pool);

    let roster = GroupRoster::new(&config.groups, Local::now().date_naive());
    tracing::info!("Tracking groups: {}", roster.snapshot().join(", "));
    let roster_task = roster.clone().start_refresh_task(config.groups.clone());

    let publisher = CloudinaryPublisher::new(
        config.cloudinary.clone(),
        config.poller.publish_timeout_secs,
    )
    .context("Failed to initialize image hosting client")?;
    let sender = TelegramSender::new(&config.telegram)
        .context("Failed to initialize messaging client")?;

    let pipeline = SchedulePipeline::new(
        &config,
        Arc::new(publisher),
        ledger,
        subscribers,
        Notifier::new(Arc::new(sender)),
        roster,
    )
    .context("Invalid analyzer configuration")?;

    let source = HttpDocumentSource::new(&config.poller).context("Failed to initialize poller")?;
    let poller = Poller::new(Arc::new(source), config.poller.sequence_code);

    let handle = PollingService::start(
        poller,
        Arc::new(pipeline),
        Duration::from_secs(config.poller.interval_secs),
    );

    shutdown_signal().await;

    let poller = handle.stop().await.context("Polling task failed")?;
    roster_task.abort();

    tracing::info!(
        "Shutdown complete, next sequence code {}",
        poller.sequence_code()
    );

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
