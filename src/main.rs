//! rss-relay — relays newly published RDF feed items to Slack and Discord.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐           ┌─────────────┐  post   ┌──────────┐
//! │  poll.rs │ ──run()─► │ pipeline.rs │ ──────► │  slack   │
//! │ (timer)  │           │   (pass)    │         └──────────┘
//! └──────────┘           └─────────────┘ enqueue ┌──────────┐  POST  ┌─────────┐
//! ┌──────────┐              ▲   │  │     ──────► │  queue   │ ─────► │ discord │
//! │server.rs │ ──run()──────┘   │  │             │ (worker) │        └─────────┘
//! │  (HTTP)  │                  │  │             └──────────┘
//! └──────────┘      fetch ◄─────┘  └────► store (cursors)
//! ```
//!
//! * **`source/`** — the `DataSource` trait, the HTTP implementation and
//!   the RDF parser.
//! * **`robots`** — robots.txt parsing and the per-feed permission check.
//! * **`detect`** — finds the items newer than a feed's cursor.
//! * **`digest`** — packs new items into size-limited Discord digests.
//! * **`notify/`** — the Slack client and the Discord queue plus its worker.
//! * **`store`** — persistent feed URL → cursor mapping.
//! * **`pipeline`** — one pass over every tracked feed.
//! * **`poll`** / **`server`** — the two triggers.
//! * **`main`** — wires everything together: load config, start the worker,
//!   the poller and the HTTP trigger, then wait for Ctrl-C.

mod config;
mod detect;
mod digest;
mod error;
mod logging;
mod notify;
mod pipeline;
mod poll;
mod robots;
mod server;
mod source;
mod store;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use config::Config;
use notify::{DiscordQueue, DiscordWorker, SlackNotifier};
use pipeline::{DeliverySettings, Pipeline};
use source::HttpSource;
use store::JsonFileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // -- configuration -------------------------------------------------------
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "rss-relay.toml".into());
    let config = Config::load(&config_path)?;
    logging::init(&config.logging.level);
    info!(config = %config_path, "starting rss-relay");
    if config.discord.max_message_length > digest::DISCORD_CONTENT_LIMIT {
        warn!(
            max_message_length = config.discord.max_message_length,
            limit = digest::DISCORD_CONTENT_LIMIT,
            "discord digests may exceed the content limit and be rejected"
        );
    }

    // -- shared HTTP client --------------------------------------------------
    let client = reqwest::Client::builder()
        .user_agent(config.poll.user_agent.clone())
        .timeout(Duration::from_secs(config.poll.request_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    // -- cursor store --------------------------------------------------------
    let store = JsonFileStore::open(&config.store.path)
        .await
        .with_context(|| format!("failed to open cursor store {}", config.store.path))?;
    let added = store::register_feeds(&store, &config.feeds.urls)
        .await
        .context("failed to register configured feeds")?;
    info!(added, "feed registration done");

    // -- discord delivery worker ---------------------------------------------
    let (queue, receiver) = DiscordQueue::bounded(config.discord.queue_capacity);
    let worker = tokio::spawn(
        DiscordWorker::new(
            client.clone(),
            config.discord.api_base.clone(),
            config.discord.token.clone(),
            receiver,
        )
        .run(),
    );

    // -- pipeline + triggers -------------------------------------------------
    let pipeline = Arc::new(Pipeline::new(
        Arc::new(store),
        Arc::new(HttpSource::with_client(client.clone())),
        Arc::new(SlackNotifier::new(
            client,
            config.slack.api_url.clone(),
            config.slack.token.clone(),
        )),
        Arc::new(queue),
        DeliverySettings {
            user_agent: config.poll.user_agent.clone(),
            slack_channel: config.slack.channel.clone(),
            discord_channel_id: config.discord.channel_id.clone(),
            max_message_length: config.discord.max_message_length,
        },
    ));

    // Bind before the first pass so a taken port fails startup.
    let listener = if config.server.enabled {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .context("invalid server address")?;
        Some(server::bind(addr).await?)
    } else {
        None
    };

    let poller = poll::spawn(
        pipeline.clone(),
        Duration::from_secs(config.poll.interval_secs.max(1)),
    );

    match listener {
        Some(listener) => server::serve(listener, pipeline.clone(), shutdown_signal()).await?,
        None => shutdown_signal().await,
    }

    // -- shutdown ------------------------------------------------------------
    // The server has closed every connection by now.  The worker exits once
    // the last queue handle (owned by the pipeline) is gone, after posting
    // whatever is still queued.
    poller.abort();
    let _ = poller.await;
    drop(pipeline);
    worker.await.context("discord worker panicked")?;

    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => error!(error = %e, "failed to listen for Ctrl-C, shutting down"),
    }
}
