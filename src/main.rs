//! Portal announcer: binary entrypoint.
//! One pass per invocation; schedule it externally (cron, systemd timer, CI).
//! Exit status is non-zero only for bad configuration or a failed setup.

use std::process::ExitCode;

use portal_announcer::{init_tracing, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    tracing::info!("{}", "=".repeat(60));
    tracing::info!(
        "PORTAL ANNOUNCEMENT BOT - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    tracing::info!("{}", "=".repeat(60));

    portal_announcer::execute(Config::from_env()).await
}
