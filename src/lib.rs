// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod announcement;
pub mod collect;
pub mod config;
pub mod error;
pub mod history;
pub mod notify;
pub mod tracker;

// ---- Re-exports for stable public API ----
pub use crate::announcement::AnnouncementRecord;
pub use crate::collect::{Collector, PortalCollector};
pub use crate::config::Config;
pub use crate::error::ConfigError;
pub use crate::history::{diff_new, History, HistoryStore};
pub use crate::notify::{MockNotifier, Notifier, TelegramNotifier};
pub use crate::tracker::{ChangeTracker, RunOutcome};

use std::process::ExitCode;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the fmt subscriber. Filter comes from `RUST_LOG`, default `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false))
        .try_init();
}

/// One scheduled invocation: collect from the portal, forward what is new to
/// Telegram, extend the history file.
///
/// Only setup failures come back as `Err`; everything after that is logged
/// and folded into the returned outcome.
pub async fn run(config: &Config) -> anyhow::Result<RunOutcome> {
    let tracker = ChangeTracker::new(
        HistoryStore::new(config.history_path.clone()),
        Box::new(TelegramNotifier::from_config(config)),
    )
    .with_send_delay(config.notify_delay);

    let collector = match PortalCollector::new(config) {
        Ok(c) => c,
        Err(e) => {
            tracker
                .report_failure(&format!("Unexpected error:\n{e}"))
                .await;
            return Err(e).context("initializing portal session");
        }
    };

    Ok(tracker.run(&collector).await)
}

/// Binary body after startup: map configuration and run results to an exit
/// status. Bad configuration fails before any network I/O.
pub async fn execute(config: Result<Config, ConfigError>) -> ExitCode {
    let config = match config {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{e}");
            tracing::error!("Configuration validation failed. Exiting.");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "configuration loaded");

    match run(&config).await {
        Ok(outcome) => {
            tracing::info!(
                new = outcome.new,
                delivered = outcome.delivered,
                failed = outcome.failed,
                persisted = outcome.persisted,
                "run complete"
            );
            tracing::info!("{}", "=".repeat(60));
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Unexpected error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
