// src/tracker.rs
//! One run: load history, collect, notify what is new, persist.
//!
//! Delivery is at-least-once. History is written only after every new record
//! was attempted, so a crash in between re-sends those records next run. A
//! record whose notification failed still enters history and is not retried.

use std::time::Duration;

use crate::announcement::{
    escape_html, truncate_escaped, AnnouncementRecord, CONTENT_MAX_CHARS,
};
use crate::collect::Collector;
use crate::history::{diff_new, History, HistoryStore};
use crate::notify::Notifier;

pub const DEFAULT_SEND_DELAY: Duration = Duration::from_secs(1);
const ERROR_TITLE: &str = "BOT ERROR";

/// What a run did. `persisted` is false when nothing needed saving or the
/// store write failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub new: usize,
    pub delivered: usize,
    pub failed: usize,
    pub persisted: bool,
}

pub struct ChangeTracker {
    store: HistoryStore,
    notifier: Box<dyn Notifier>,
    send_delay: Duration,
}

impl ChangeTracker {
    pub fn new(store: HistoryStore, notifier: Box<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            send_delay: DEFAULT_SEND_DELAY,
        }
    }

    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = delay;
        self
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub async fn load_history(&self) -> History {
        let history = self.store.load().await;
        tracing::info!("Loaded {} previously saved announcement(s)", history.len());
        history
    }

    /// Notify every record of `current` missing from `previous`, then append
    /// them to the store.
    pub async fn dispatch_and_persist(
        &self,
        current: &[AnnouncementRecord],
        previous: History,
    ) -> RunOutcome {
        let new_ones = diff_new(current, &previous);
        let mut outcome = RunOutcome {
            new: new_ones.len(),
            ..RunOutcome::default()
        };
        if new_ones.is_empty() {
            tracing::info!("No new announcements");
            return outcome;
        }

        tracing::info!(
            notifier = self.notifier.name(),
            "Sending {} notification(s)",
            new_ones.len()
        );
        for (i, ann) in new_ones.iter().enumerate() {
            if i > 0 && !self.send_delay.is_zero() {
                tokio::time::sleep(self.send_delay).await;
            }
            if self.notifier.send(&ann.title, &ann.content).await {
                outcome.delivered += 1;
            } else {
                outcome.failed += 1;
                tracing::warn!(
                    href = ann.href.as_deref().unwrap_or("NO HREF"),
                    "notification failed, recording as seen anyway"
                );
            }
        }

        match self.store.persist(&previous, &new_ones).await {
            Ok(total) => {
                outcome.persisted = true;
                tracing::info!("Saved {total} total announcement(s)");
            }
            Err(e) => tracing::error!("Error saving announcements: {e}"),
        }
        outcome
    }

    /// Full lifecycle against `collector`. Collection failures are reported
    /// through the notifier and end the run as a no-op.
    pub async fn run(&self, collector: &dyn Collector) -> RunOutcome {
        let previous = self.load_history().await;

        let current = match collector.fetch().await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(
                    collector = collector.name(),
                    "Error fetching announcements: {e}"
                );
                self.report_failure(&format!("Failed to fetch announcements:\n{e}"))
                    .await;
                Vec::new()
            }
        };

        if current.is_empty() {
            tracing::info!("No announcements found");
            return RunOutcome::default();
        }
        self.dispatch_and_persist(&current, previous).await
    }

    /// Best-effort operator alert.
    pub async fn report_failure(&self, detail: &str) -> bool {
        let content = truncate_escaped(&escape_html(detail), CONTENT_MAX_CHARS);
        self.notifier.send(ERROR_TITLE, &content).await
    }
}
