//! Per-author durable storage
//!
//! Maps an author identifier to a directory of append-only table files plus
//! a one-time first-seen marker. All file writes are deferred to the single
//! writer task; the store itself only touches the filesystem for directory
//! and marker lifecycle.

pub mod writer;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use writer::{WriteMessage, WriteTask};

/// Characters unsafe in directory names, replaced with `_`.
const UNSAFE_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Append-only tables kept per author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Posts,
    Links,
    Media,
}

impl Table {
    pub fn file_name(self) -> &'static str {
        match self {
            Table::Posts => "posts.csv",
            Table::Links => "links.csv",
            Table::Media => "media.csv",
        }
    }

    /// Header row, written once when the table file is created.
    pub fn header(self) -> &'static [&'static str] {
        match self {
            Table::Posts => &[
                "timestamp",
                "text",
                "has_images",
                "has_links",
                "is_reply",
                "reply_to_uri",
                "thread_root_uri",
                "image_count",
                "link_count",
                "hashtag_count",
            ],
            Table::Links => &["timestamp", "url", "domain", "context_text"],
            Table::Media => &["timestamp", "image_alt", "image_type", "context_text"],
        }
    }
}

/// Handle to one author's directory.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    dir: PathBuf,
}

impl EntityRecord {
    pub fn table_path(&self, table: Table) -> PathBuf {
        self.dir.join(table.file_name())
    }

    fn marker_path(&self) -> PathBuf {
        self.dir.join(".counted")
    }
}

/// Store of per-author records under `<data-dir>/users/`.
pub struct EntityStore {
    users_dir: PathBuf,
    queue: mpsc::Sender<WriteMessage>,
}

impl EntityStore {
    pub fn new(data_dir: &Path, queue: mpsc::Sender<WriteMessage>) -> io::Result<Self> {
        let users_dir = data_dir.join("users");
        fs::create_dir_all(&users_dir)?;
        Ok(Self { users_dir, queue })
    }

    /// Resolve (creating if absent) the directory for an author. Idempotent.
    pub fn get_or_create(&self, author: &str) -> io::Result<EntityRecord> {
        let dir = self.users_dir.join(sanitize_author(author));
        fs::create_dir_all(&dir)?;
        Ok(EntityRecord { dir })
    }

    /// Check-and-create the first-seen marker.
    ///
    /// Returns true exactly once per author, including across restarts.
    /// The exclusive create makes the check atomic against the startup
    /// pre-scan path.
    pub fn is_first_seen(&self, record: &EntityRecord) -> bool {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(record.marker_path())
        {
            Ok(_) => true,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => false,
            Err(e) => {
                log::warn!(
                    "Failed to create marker in {}: {}",
                    record.dir.display(),
                    e
                );
                false
            }
        }
    }

    /// Hand a row append to the write queue. Never writes synchronously;
    /// blocks only on queue backpressure.
    pub async fn enqueue(&self, record: &EntityRecord, table: Table, row: Vec<String>) {
        let task = WriteTask {
            path: record.table_path(table),
            row,
            header: table.header(),
        };
        if self.queue.send(WriteMessage::Task(task)).await.is_err() {
            log::warn!("Write queue closed, dropping {} row", table.file_name());
        }
    }

    /// Count existing author directories that hold data and mark them
    /// counted. Seeds the global user total after a restart.
    pub fn scan_existing_users(&self) -> u64 {
        let entries = match fs::read_dir(&self.users_dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to scan {}: {}", self.users_dir.display(), e);
                return 0;
            }
        };

        let mut total = 0;
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() || !has_table_data(&dir) {
                continue;
            }
            total += 1;
            let record = EntityRecord { dir };
            // Marker may already exist from a previous run; either way the
            // author is now counted
            self.is_first_seen(&record);
        }
        total
    }
}

fn has_table_data(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.flatten().any(|f| {
                f.path()
                    .extension()
                    .map(|ext| ext == "csv")
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

/// Deterministic filesystem-safe transform of an author identifier.
pub fn sanitize_author(author: &str) -> String {
    author
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}
