//! Operation counters with Prometheus text exposition.
//!
//! The registry is a plain value owned by the process and handed to whatever
//! records into it. Counters are keyed by operation label, only ever
//! incremented, and live as long as the registry.

use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{extract::State, http::header, response::IntoResponse, Router};
use dashmap::DashMap;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

pub const OPERATIONS_METRIC: &str = "calculator_operations_total";
const OPERATIONS_HELP: &str = "Total number of calculator operations";
const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[derive(Debug, Default)]
pub struct Metrics {
    operations: DashMap<String, AtomicU64>,
    exposing: AtomicBool,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the operation counter for `operation` by one.
    pub fn track_operation(&self, operation: &str) {
        self.operations
            .entry(operation.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn operation_count(&self, operation: &str) -> u64 {
        self.operations
            .get(operation)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Render in Prometheus text exposition format, labels sorted.
    pub fn render(&self) -> String {
        let mut samples: Vec<(String, u64)> = self
            .operations
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Relaxed)))
            .collect();
        samples.sort();

        let mut out = String::new();
        let _ = writeln!(out, "# HELP {} {}", OPERATIONS_METRIC, OPERATIONS_HELP);
        let _ = writeln!(out, "# TYPE {} counter", OPERATIONS_METRIC);
        for (operation, value) in samples {
            let _ = writeln!(
                out,
                "{}{{operation=\"{}\"}} {}",
                OPERATIONS_METRIC,
                escape_label(&operation),
                value
            );
        }
        out
    }

    pub fn is_exposing(&self) -> bool {
        self.exposing.load(Ordering::SeqCst)
    }

    /// Serve the text exposition on `addr` from a background task.
    ///
    /// Returns the bound address, or `None` when this registry is already
    /// being exposed. A failed bind leaves the registry startable again.
    pub async fn start_exposition(self: &Arc<Self>, addr: SocketAddr) -> Result<Option<SocketAddr>> {
        if self
            .exposing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Metrics exposition already running");
            return Ok(None);
        }

        let bound = async {
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind metrics endpoint to {addr}"))?;
            let local = listener
                .local_addr()
                .context("Failed to read metrics endpoint address")?;
            anyhow::Ok((listener, local))
        }
        .await;

        let (listener, local) = match bound {
            Ok(bound) => bound,
            Err(e) => {
                self.exposing.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let app = Router::new()
            .fallback(serve_metrics)
            .with_state(Arc::clone(self));

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Metrics server error: {}", e);
            }
        });

        info!("Metrics exposition listening on http://{}/metrics", local);
        Ok(Some(local))
    }
}

async fn serve_metrics(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], metrics.render())
}
