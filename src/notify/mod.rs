pub mod telegram;

use std::sync::{Arc, Mutex};

pub use telegram::TelegramNotifier;

/// Push channel for announcements.
///
/// `title` and `content` arrive already HTML-escaped. Implementations report
/// delivery as a plain bool and log their own failures; nothing is thrown
/// back to the dispatch loop.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, title: &str, content: &str) -> bool;
    fn name(&self) -> &'static str;
}

/// In-memory notifier for tests and dry runs: records every call and answers
/// with a fixed result.
#[derive(Debug, Clone)]
pub struct MockNotifier {
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
    succeed: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(vec![])),
            succeed: true,
        }
    }

    pub fn failing() -> Self {
        Self {
            succeed: false,
            ..Self::new()
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl Default for MockNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Notifier for MockNotifier {
    async fn send(&self, title: &str, content: &str) -> bool {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((title.to_string(), content.to_string()));
        }
        self.succeed
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_records_calls_and_shares_log_across_clones() {
        let mock = MockNotifier::failing();
        let handle = mock.clone();
        assert!(!mock.send("t", "c").await);
        assert_eq!(handle.sent(), vec![("t".to_string(), "c".to_string())]);
    }
}
