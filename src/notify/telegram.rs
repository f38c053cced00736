use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use super::Notifier;
use crate::config::Config;
use crate::error::NotifyError;

const HEADER: &str = "<b>📢 YENİ DUYURU</b>";

/// Telegram Bot API `sendMessage` in HTML parse mode.
#[derive(Clone)]
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    chat_id: String,
    client: Client,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            token: token.into(),
            chat_id: chat_id.into(),
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.telegram_api_base.clone(),
            cfg.telegram_token.clone(),
            cfg.telegram_chat_id.clone(),
        )
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    pub async fn try_send(&self, title: &str, content: &str) -> Result<(), NotifyError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text: format_message(title, content),
            parse_mode: "HTML",
        };

        let rsp = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = rsp.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        let body = rsp.text().await.unwrap_or_default();
        Err(NotifyError::Rejected { status, body })
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, title: &str, content: &str) -> bool {
        match self.try_send(title, content).await {
            Ok(()) => {
                let short: String = title.chars().take(50).collect();
                tracing::info!("Telegram notification sent: {short}");
                true
            }
            Err(e) => {
                // reqwest errors carry the URL, which embeds the bot token
                let e = match e {
                    NotifyError::Transport(inner) => NotifyError::Transport(inner.without_url()),
                    other => other,
                };
                tracing::error!("{e}");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

/// Message body as shown in the chat. Inputs must already be escaped.
pub fn format_message(title: &str, content: &str) -> String {
    format!("{HEADER}\n\n<b>{title}</b>\n\n{content}")
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}
