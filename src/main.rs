use anyhow::{Context, Result};
use tracing::{error, info, warn};

use cibot::config::{self, process_env};
use cibot::logging;
use cibot::notifier::CiNotifier;

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    logging::init(Some(&config::log_file(&process_env)));

    // Logged only, the exit status stays zero
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
    }
}

async fn run() -> Result<()> {
    let notifier = CiNotifier::from_env().context("Failed to configure CI notifier")?;
    info!("Notifying chat {}", notifier.client().chat_id());

    if notifier.send_ci_notification(None).await {
        info!("CI notification delivered");
    } else {
        warn!("CI notification was not delivered");
    }

    Ok(())
}
