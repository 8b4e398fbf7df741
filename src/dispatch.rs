//! Per-event orchestration
//!
//! One dispatcher task receives decoded post records sequentially and is the
//! sole mutator of the stats engine. For each record it resolves the author's
//! store record, performs the one-time first-seen check, derives fields,
//! enqueues the table appends and updates the aggregates, timing itself along
//! the way. A failing record is logged and dropped; ingestion continues.

use {
    crate::event::PostEvent,
    crate::extract::{extract_domain, extract_hashtags, sanitize_text},
    crate::stats::{EventStats, StatsEngine},
    crate::store::{EntityStore, Table},
    chrono::Utc,
    std::{sync::Arc, time::Instant},
    tokio::sync::{mpsc, RwLock},
};

/// Message sent from the event source to the dispatcher task.
#[derive(Debug)]
pub enum DispatchMessage {
    Post(PostEvent),
    Shutdown,
}

pub struct IngestionDispatcher {
    store: EntityStore,
    stats: Arc<RwLock<StatsEngine>>,
}

impl IngestionDispatcher {
    pub fn new(store: EntityStore, stats: Arc<RwLock<StatsEngine>>) -> Self {
        Self { store, stats }
    }

    /// Process one decoded post record end to end.
    ///
    /// Writes already enqueued before a failure are not rolled back.
    pub async fn handle(&self, event: &PostEvent) -> std::io::Result<()> {
        let started = Instant::now();
        let now = Utc::now().timestamp();

        let record = self.store.get_or_create(&event.author)?;
        let is_new_user = self.store.is_first_seen(&record);

        let text = sanitize_text(Some(&event.text));
        let hashtags = extract_hashtags(&event.text);
        let has_images = event.has_images();
        let image_count = event.images().len();
        let link_count = event.link_count();
        // The row flag follows the raw payload: any facet at all marks the
        // post as link-bearing, while stats count actual link features
        let row_has_links = !event.facets.is_empty();

        let (reply_to_uri, thread_root_uri) = match &event.reply {
            Some(reply) => (reply.parent.uri.clone(), reply.root.uri.clone()),
            None => (String::new(), String::new()),
        };

        let posts_row = vec![
            event.created_at.clone(),
            text.clone(),
            flag(has_images),
            flag(row_has_links),
            flag(event.reply.is_some()),
            reply_to_uri,
            thread_root_uri,
            image_count.to_string(),
            link_count.to_string(),
            hashtags.len().to_string(),
        ];
        self.store.enqueue(&record, Table::Posts, posts_row).await;

        let mut link_domains = Vec::new();
        for feature in event.link_features() {
            let domain = extract_domain(&feature.uri);
            let links_row = vec![
                event.created_at.clone(),
                feature.uri.clone(),
                domain.clone(),
                text.clone(),
            ];
            self.store.enqueue(&record, Table::Links, links_row).await;
            link_domains.push(domain);
        }

        let mut image_mimes = Vec::new();
        for image in event.images() {
            let media_row = vec![
                event.created_at.clone(),
                sanitize_text(Some(&image.alt)),
                image.mime.clone(),
                text.clone(),
            ];
            self.store.enqueue(&record, Table::Media, media_row).await;
            image_mimes.push(image.mime.clone());
        }

        let event_stats = EventStats {
            author: event.author.clone(),
            text,
            has_images,
            has_links: link_count > 0,
            image_mimes,
            link_domains,
            hashtags,
            is_new_user,
        };

        // The in-flight event counts in the window it arrived in, so record
        // before advancing
        let mut stats = self.stats.write().await;
        stats.record_event(now, event_stats);
        stats.advance_windows(now);
        stats.record_latency(started.elapsed());

        Ok(())
    }
}

/// Background task that drains the ingest channel one record at a time.
pub async fn dispatcher_task(
    mut receiver: mpsc::Receiver<DispatchMessage>,
    dispatcher: IngestionDispatcher,
) {
    log::info!("Dispatcher task started");

    while let Some(message) = receiver.recv().await {
        match message {
            DispatchMessage::Post(event) => {
                if let Err(e) = dispatcher.handle(&event).await {
                    log::error!("Failed to process post from {}: {}", event.author, e);
                }
            }
            DispatchMessage::Shutdown => {
                log::info!("Dispatcher received shutdown signal");
                break;
            }
        }
    }

    log::info!("Dispatcher task stopped");
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}
