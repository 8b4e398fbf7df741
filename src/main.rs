
pub mod analytics;
pub mod config;
pub mod dispatch;
pub mod event;
pub mod extract;
pub mod source;
pub mod stats;
pub mod store;
pub mod ui;

use {
    config::Config,
    dispatch::{dispatcher_task, DispatchMessage, IngestionDispatcher},
    source::{EventSource, JsonlSource},
    stats::StatsEngine,
    store::{writer, EntityStore},
    std::{path::Path, sync::Arc, time::Duration},
    tokio::sync::{mpsc, RwLock},
};

/// Wire up the pipeline and run it until the UI exits or Ctrl-C arrives.
///
/// Shutdown order matters: the source stops first, the dispatcher drains the
/// ingest queue, the writer drains the write queue behind its poison pill,
/// and only then is the final aggregate exported.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = Path::new(&config.data_dir).to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    log::info!("Starting skyflow");
    log::info!("Saving data to {}", data_dir.display());

    // Write queue: single consumer gives per-file FIFO append order
    let (write_tx, write_rx) = mpsc::channel(config.write_queue_capacity);
    let writer_handle = tokio::spawn(writer::writer_task(write_rx));

    let store = EntityStore::new(&data_dir, write_tx.clone())?;

    let mut engine = StatsEngine::new(chrono::Utc::now().timestamp());
    let existing_users = store.scan_existing_users();
    if existing_users > 0 {
        log::info!("Found {} existing users", existing_users);
        engine.add_existing_users(existing_users);
    }
    let stats = Arc::new(RwLock::new(engine));

    // Ingest channel: events are processed one at a time by a single task,
    // which is what makes engine mutation safe behind the write lock
    let (ingest_tx, ingest_rx) = mpsc::channel::<DispatchMessage>(1000);
    let dispatcher = IngestionDispatcher::new(store, stats.clone());
    let dispatch_handle = tokio::spawn(dispatcher_task(ingest_rx, dispatcher));

    // Event source: JSONL replay when configured, otherwise the pipeline
    // idles waiting for an externally wired source
    let source_handle = match &config.replay_file {
        Some(path) => {
            let source = JsonlSource::open(path).await?;
            let tx = ingest_tx.clone();
            Some(tokio::spawn(pump_source(source, tx)))
        }
        None => {
            log::warn!("REPLAY_FILE not set; no event source configured");
            None
        }
    };

    if config.enable_ui {
        let stats_for_ui = stats.clone();
        let refresh = Duration::from_millis(config.ui_refresh_ms);
        let ui_handle = tokio::spawn(async move {
            if let Err(e) = ui::run_ui(stats_for_ui, refresh).await {
                log::error!("UI error: {}", e);
            }
        });

        tokio::select! {
            _ = ui_handle => log::info!("UI exited"),
            _ = tokio::signal::ctrl_c() => log::info!("Interrupt received"),
        }
    } else {
        tokio::signal::ctrl_c().await?;
        log::info!("Interrupt received");
    }

    // Stop accepting new records before draining
    if let Some(handle) = source_handle {
        handle.abort();
    }

    if ingest_tx.send(DispatchMessage::Shutdown).await.is_err() {
        log::warn!("Dispatcher already stopped");
    }
    let _ = dispatch_handle.await;

    // Poison pill; the writer drains everything enqueued before it
    if write_tx.send(writer::WriteMessage::Shutdown).await.is_err() {
        log::warn!("Writer already stopped");
    }
    let _ = writer_handle.await;

    let snapshot = {
        let stats = stats.read().await;
        stats.snapshot(chrono::Utc::now().timestamp())
    };
    analytics::export_final(&snapshot, &data_dir)?;

    log::info!(
        "Done: {} posts from {} users",
        snapshot.total_posts,
        snapshot.total_users
    );
    Ok(())
}

/// Feed events from a source into the ingest channel until it is exhausted.
async fn pump_source(mut source: impl EventSource, tx: mpsc::Sender<DispatchMessage>) {
    loop {
        match source.next_event().await {
            Ok(Some(event)) => {
                if tx.send(DispatchMessage::Post(event)).await.is_err() {
                    log::warn!("Ingest channel closed, stopping source");
                    break;
                }
            }
            Ok(None) => {
                log::info!("Event source exhausted");
                break;
            }
            Err(e) => {
                log::error!("Event source error: {}", e);
                break;
            }
        }
    }
}
