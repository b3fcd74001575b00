use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use aeroflow::chain::{FeedRecord, PoolEvent};
use aeroflow::{Engine, MemoryStore, Outcome, RpcChainReader, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    // Load configuration
    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    let store = Arc::new(MemoryStore::new());
    let reader = Arc::new(
        RpcChainReader::new(
            &settings.rpc.url,
            Duration::from_secs(settings.rpc.call_timeout_secs),
        )
        .context("Failed to create RPC chain reader")?,
    );
    let engine = Engine::new(store.clone(), reader);

    let cancellation_token = CancellationToken::new();
    spawn_signal_handler(cancellation_token.clone())?;

    info!("Aggregation engine running. Press Ctrl+C to stop.");

    // The sync collaborator delivers one decoded event per line, in
    // non-decreasing (block number, log index) order.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let tracked_factory = settings.indexer.factory_address.to_lowercase();
    let progress_interval = Duration::from_secs(settings.indexer.progress_interval_secs);

    let mut applied: u64 = 0;
    let mut skipped: u64 = 0;
    let mut last_progress_log = Instant::now();

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Received shutdown signal, exiting gracefully...");
                break;
            },
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from the event feed")? else {
                    info!("Event feed closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let record: FeedRecord =
                    serde_json::from_str(&line).context("Malformed feed line")?;

                // Creations from factories we do not track never reach the
                // engine; their pools then fall out as unknown-pool skips.
                if matches!(record.event, PoolEvent::PoolCreated { .. })
                    && record.meta.address.to_lowercase() != tracked_factory
                {
                    continue;
                }

                match engine.apply(&record.meta, &record.event).await {
                    Ok(Outcome::Applied) => applied += 1,
                    Ok(Outcome::UnknownPool) => skipped += 1,
                    Err(e) => {
                        // The failed event was discarded whole; it must be
                        // re-delivered before the feed advances, so stop
                        // here instead of silently moving past it.
                        error!(
                            "Failed to apply event at block {} log {}: {:#}",
                            record.meta.block_number, record.meta.log_index, e
                        );
                        return Err(e.into());
                    },
                }

                if last_progress_log.elapsed() >= progress_interval {
                    info!(
                        "Processed {} events ({} unknown-pool skips), {} rows",
                        applied,
                        skipped,
                        store.row_count().await
                    );
                    last_progress_log = Instant::now();
                }
            },
        }
    }

    info!(
        "Feed complete: {} events applied, {} skipped, {} rows",
        applied,
        skipped,
        store.row_count().await
    );

    Ok(())
}

fn spawn_signal_handler(cancellation_token: CancellationToken) -> anyhow::Result<()> {
    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = sigterm_stream.recv() => {},
            };
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }

        cancellation_token.cancel();
    });

    Ok(())
}
