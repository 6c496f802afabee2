//! Calculator with Prometheus metrics.
//!
//! Starts the metrics endpoint (`METRICS_HOST`/`METRICS_PORT`, default
//! `0.0.0.0:8000`), then evaluates `<op> <a> [<b>]` lines from stdin, e.g.
//! `divide 6 3` or `sqrt 2`. Once input is closed the endpoint keeps serving
//! until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use cibot::calculator::Calculator;
use cibot::config::{self, process_env};
use cibot::logging;
use cibot::metrics::Metrics;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    logging::init(None);

    let addr = config::metrics_addr(&process_env).await?;
    let metrics = Arc::new(Metrics::new());
    metrics.start_exposition(addr).await?;

    let calculator = Calculator::new(Arc::clone(&metrics));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match calculator.evaluate_line(line) {
            Ok(result) => println!("{result}"),
            Err(e) => warn!("{}: {}", line, e),
        }
    }

    info!("Input closed, serving metrics until Ctrl-C");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    Ok(())
}
