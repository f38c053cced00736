//! Sends one test message with the configured Telegram credentials.

use std::process::ExitCode;

use portal_announcer::announcement::escape_html;
use portal_announcer::{init_tracing, Config, Notifier, TelegramNotifier};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let notifier = TelegramNotifier::from_config(&config);
    let body = format!(
        "Probe from {} <{}>",
        config.portal_username,
        config.portal_url
    );
    if notifier.send("Probe", &escape_html(&body)).await {
        println!("notify-probe delivered");
        ExitCode::SUCCESS
    } else {
        println!("notify-probe failed, see log");
        ExitCode::FAILURE
    }
}
