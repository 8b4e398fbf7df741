use std::env;

/// Configuration loaded from environment variables
pub struct Config {
    /// Root directory for per-author tables and analytics exports
    pub data_dir: String,
    /// JSONL file of decoded post records to replay (the live firehose
    /// subscription is provided by an external collaborator)
    pub replay_file: Option<String>,
    /// Bound of the write queue; producers feel backpressure beyond this
    pub write_queue_capacity: usize,
    /// Display refresh interval in milliseconds
    pub ui_refresh_ms: u64,
    /// Set ENABLE_UI=false to run headless (logs only, no dashboard)
    pub enable_ui: bool,
    pub rust_log: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Everything has a default; REPLAY_FILE is genuinely optional since a
    /// live source can be wired in instead.
    pub fn from_env() -> Self {
        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "bluesky_data".to_string());

        let replay_file = env::var("REPLAY_FILE").ok();

        let write_queue_capacity = env::var("WRITE_QUEUE_CAPACITY")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(10_000);

        let ui_refresh_ms = env::var("UI_REFRESH_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(250);

        let enable_ui = env::var("ENABLE_UI")
            .map(|s| s.to_lowercase() != "false")
            .unwrap_or(true);

        let rust_log = env::var("RUST_LOG").ok();

        Self {
            data_dir,
            replay_file,
            write_queue_capacity,
            ui_refresh_ms,
            enable_ui,
            rust_log,
        }
    }
}
