use std::fs::File;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use explorer_api::{router, ApiConfig, AppState, ResponseCache};
use explorer_governance::Sources;
use explorer_store::{SledStore, Snapshot};
use explorer_types::Network;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, Level, Subscriber};
use tracing_subscriber::FmtSubscriber;

/// DAO explorer governance API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(short, long)]
    listen: Option<String>,

    /// Path of the sled database
    #[arg(long)]
    store_path: Option<String>,

    /// JSON snapshot to import before serving
    #[arg(long)]
    snapshot: Option<String>,

    /// Networks to serve
    #[arg(long, value_delimiter = ',')]
    networks: Option<Vec<Network>>,

    /// Set logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Path to the log file (optional). If not provided, logs will only go to stdout.
    #[arg(long)]
    log_file: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber_builder = FmtSubscriber::builder()
        .with_max_level(args.log_level.parse::<Level>().unwrap_or(Level::INFO));

    // The guard flushes buffered file logs when main returns.
    let (subscriber, _log_guard): (Box<dyn Subscriber + Send + Sync>, _) =
        if let Some(log_file_path) = &args.log_file {
            let file = File::create(log_file_path)
                .with_context(|| format!("Failed to create log file {}", log_file_path))?;
            let (non_blocking_writer, guard) = tracing_appender::non_blocking(file);
            (
                Box::new(subscriber_builder.with_writer(non_blocking_writer).finish()),
                Some(guard),
            )
        } else {
            (Box::new(subscriber_builder.finish()), None)
        };

    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;
    tracing_log::LogTracer::init().context("bridging log records failed")?;

    let mut cfg = ApiConfig::load();

    // Override config with CLI arguments if provided
    if let Some(listen) = args.listen {
        cfg.listen_addr = listen;
    }
    if let Some(store_path) = args.store_path {
        cfg.store_path = store_path;
    }
    if args.snapshot.is_some() {
        cfg.snapshot_path = args.snapshot;
    }
    if let Some(networks) = args.networks {
        cfg.networks = networks;
    }
    info!("Loaded configuration: {:#?}", cfg);
    cfg.validate()?;

    let store = Arc::new(SledStore::open(&cfg.store_path, cfg.store)?);
    if let Some(path) = &cfg.snapshot_path {
        let snapshot = Snapshot::from_path(path)?;
        store.import(&snapshot)?;
    }

    let cache = ResponseCache::new(cfg.cache_capacity, cfg.cache_ttl());
    let state = AppState::connect(&cfg.networks, Sources::from_store(store.clone()), cfg.tally, cache).await;
    if state.networks().is_empty() {
        anyhow::bail!("no network could be served");
    }
    let shutdown_token = state.shutdown.clone();

    let (shutdown_sender, _shutdown_receiver) = broadcast::channel::<()>(1);

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.listen_addr))?;
    info!("Explorer API listening on {}", cfg.listen_addr);

    let mut server_shutdown_receiver = shutdown_sender.subscribe();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_shutdown_receiver.recv().await.ok();
            })
            .await
    });

    signal::ctrl_c().await.context("Failed to listen for ctrl-c event")?;
    info!("Ctrl+C received, sending shutdown signal.");
    shutdown_token.cancel();
    shutdown_sender.send(()).ok();

    match server.await {
        Ok(Ok(())) => info!("HTTP server shut down."),
        Ok(Err(e)) => error!("HTTP server failed: {}", e),
        Err(e) => error!("HTTP server task panicked: {}", e),
    }

    store.flush()?;
    cfg.save();

    Ok(())
}
