//! HTTP trigger.
//!
//! `GET /` or `POST /` runs one pass and answers `OK` once it is done.  The
//! response never reflects per-feed results; those go to the log.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::pipeline::Pipeline;

pub fn router(pipeline: Arc<Pipeline>) -> Router {
    Router::new()
        .route("/", get(trigger).post(trigger))
        .with_state(pipeline)
}

async fn trigger(State(pipeline): State<Arc<Pipeline>>) -> &'static str {
    let report = pipeline.run().await;
    debug!(
        delivered = report.delivered(),
        failed = report.failures.len(),
        "triggered pass finished"
    );
    "OK"
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind trigger endpoint on {addr}"))
}

/// Serve the trigger on `listener` until `shutdown` resolves.
///
/// Returns only after every open connection has closed, idle keep-alive
/// connections included, so no handler still holds the pipeline afterwards.
pub async fn serve<F>(listener: TcpListener, pipeline: Arc<Pipeline>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "trigger endpoint listening");
    }
    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(shutdown)
        .await
        .context("trigger endpoint failed")?;
    info!("trigger endpoint stopped");
    Ok(())
}
