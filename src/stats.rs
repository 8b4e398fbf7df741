//! In-memory aggregate state for the live dashboard
//!
//! Uses single-owner mutation: the dispatcher task is the only writer, the
//! UI task only ever sees copied-out snapshots. Minute/hour windows advance
//! by wall-clock comparison when an event arrives, never by timer, so a
//! silent stream synthesizes no empty windows.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    time::Duration,
};

/// Completed-minute history length (one hour of minutes).
pub const MINUTE_HISTORY_LEN: usize = 60;
/// Completed-hour history length (one day of hours).
pub const HOUR_HISTORY_LEN: usize = 24;
/// Most-recent-activity ring length.
pub const RECENT_POSTS_LEN: usize = 5;
/// Processing-latency sample window length.
pub const LATENCY_SAMPLES_LEN: usize = 1000;

const MINUTE_SECS: i64 = 60;
const HOUR_SECS: i64 = 3600;

/// Per-event increments derived by the dispatcher.
#[derive(Debug, Clone, Default)]
pub struct EventStats {
    pub author: String,
    /// Sanitized post text, for the recent-activity ring
    pub text: String,
    pub has_images: bool,
    pub has_links: bool,
    /// MIME type of each attached image
    pub image_mimes: Vec<String>,
    /// Extracted domain of each link feature ("unknown" entries are skipped)
    pub link_domains: Vec<String>,
    pub hashtags: Vec<String>,
    /// True when the author's first-seen marker was created by this event
    pub is_new_user: bool,
}

/// One entry of the recent-activity ring.
#[derive(Debug, Clone)]
pub struct RecentPost {
    pub timestamp: i64,
    pub author: String,
    pub text: String,
}

/// Mutable aggregate state. Owned by the dispatcher task.
pub struct StatsEngine {
    start_time: i64,
    total_posts: u64,
    total_users: u64,
    posts_with_images: u64,
    posts_with_links: u64,

    posts_this_minute: u64,
    posts_per_minute: VecDeque<u64>,
    posts_per_hour: VecDeque<u64>,
    last_minute_rollover: i64,
    last_hour_rollover: i64,

    popular_domains: HashMap<String, u64>,
    media_types: HashMap<String, u64>,
    hashtag_stats: HashMap<String, u64>,
    most_active_users: HashMap<String, u64>,
    active_users_this_hour: HashSet<String>,

    recent_posts: VecDeque<RecentPost>,
    processing_times: VecDeque<Duration>,
}

impl StatsEngine {
    pub fn new(start_time: i64) -> Self {
        Self {
            start_time,
            total_posts: 0,
            total_users: 0,
            posts_with_images: 0,
            posts_with_links: 0,
            posts_this_minute: 0,
            posts_per_minute: VecDeque::with_capacity(MINUTE_HISTORY_LEN),
            posts_per_hour: VecDeque::with_capacity(HOUR_HISTORY_LEN),
            last_minute_rollover: start_time,
            last_hour_rollover: start_time,
            popular_domains: HashMap::new(),
            media_types: HashMap::new(),
            hashtag_stats: HashMap::new(),
            most_active_users: HashMap::new(),
            active_users_this_hour: HashSet::new(),
            recent_posts: VecDeque::with_capacity(RECENT_POSTS_LEN),
            processing_times: VecDeque::with_capacity(LATENCY_SAMPLES_LEN),
        }
    }

    /// Seed the global user total from the startup directory pre-scan.
    pub fn add_existing_users(&mut self, count: u64) {
        self.total_users += count;
    }

    /// Record one ingested event's contribution.
    pub fn record_event(&mut self, now: i64, event: EventStats) {
        self.total_posts += 1;
        self.posts_this_minute += 1;

        if event.is_new_user {
            self.total_users += 1;
        }

        self.active_users_this_hour.insert(event.author.clone());
        *self
            .most_active_users
            .entry(event.author.clone())
            .or_default() += 1;

        if event.has_images {
            self.posts_with_images += 1;
            for mime in &event.image_mimes {
                *self.media_types.entry(mime.clone()).or_default() += 1;
            }
        }

        if event.has_links {
            self.posts_with_links += 1;
        }
        for domain in &event.link_domains {
            // Malformed URLs yield the sentinel; those never count
            if domain != "unknown" {
                *self.popular_domains.entry(domain.clone()).or_default() += 1;
            }
        }

        for tag in &event.hashtags {
            *self.hashtag_stats.entry(tag.to_lowercase()).or_default() += 1;
        }

        self.recent_posts.push_front(RecentPost {
            timestamp: now,
            author: event.author,
            text: event.text,
        });
        while self.recent_posts.len() > RECENT_POSTS_LEN {
            self.recent_posts.pop_back();
        }
    }

    /// Push a per-event processing duration into the sample window.
    ///
    /// FIFO eviction beyond the window length, not reservoir sampling.
    pub fn record_latency(&mut self, elapsed: Duration) {
        self.processing_times.push_back(elapsed);
        while self.processing_times.len() > LATENCY_SAMPLES_LEN {
            self.processing_times.pop_front();
        }
    }

    /// Roll minute/hour windows forward if their boundaries have elapsed.
    ///
    /// Called once per ingested event, after that event's own contribution,
    /// so an in-flight event counts in the window it arrived in.
    pub fn advance_windows(&mut self, now: i64) {
        if now - self.last_minute_rollover >= MINUTE_SECS {
            self.posts_per_minute.push_back(self.posts_this_minute);
            while self.posts_per_minute.len() > MINUTE_HISTORY_LEN {
                self.posts_per_minute.pop_front();
            }
            self.posts_this_minute = 0;
            self.last_minute_rollover = now;
        }

        if now - self.last_hour_rollover >= HOUR_SECS {
            let hour_total: u64 = self.posts_per_minute.iter().sum();
            self.posts_per_hour.push_back(hour_total);
            while self.posts_per_hour.len() > HOUR_HISTORY_LEN {
                self.posts_per_hour.pop_front();
            }
            self.last_hour_rollover = now;
            self.active_users_this_hour.clear();
        }
    }

    /// Copy out a consistent point-in-time view for the display layer.
    ///
    /// Nothing mutable escapes by reference; the snapshot is safe to hold
    /// across refresh cycles.
    pub fn snapshot(&self, now: i64) -> StatsSnapshot {
        StatsSnapshot {
            runtime_seconds: (now - self.start_time).max(0),
            total_posts: self.total_posts,
            total_users: self.total_users,
            posts_with_images: self.posts_with_images,
            posts_with_links: self.posts_with_links,
            posts_this_minute: self.posts_this_minute,
            posts_per_minute: self.posts_per_minute.iter().copied().collect(),
            posts_per_hour: self.posts_per_hour.iter().copied().collect(),
            popular_domains: self.popular_domains.clone(),
            media_types: self.media_types.clone(),
            hashtag_stats: self.hashtag_stats.clone(),
            most_active_users: self.most_active_users.clone(),
            active_users_this_hour: self.active_users_this_hour.len() as u64,
            recent_posts: self.recent_posts.iter().cloned().collect(),
            processing: LatencyStats::from_samples(&self.processing_times),
        }
    }
}

/// Immutable, display-ready copy of engine state.
#[derive(Debug, Clone)]
pub struct StatsSnapshot {
    pub runtime_seconds: i64,
    pub total_posts: u64,
    pub total_users: u64,
    pub posts_with_images: u64,
    pub posts_with_links: u64,
    pub posts_this_minute: u64,
    /// Completed per-minute counts, oldest first
    pub posts_per_minute: Vec<u64>,
    /// Completed per-hour totals, oldest first
    pub posts_per_hour: Vec<u64>,
    pub popular_domains: HashMap<String, u64>,
    pub media_types: HashMap<String, u64>,
    pub hashtag_stats: HashMap<String, u64>,
    pub most_active_users: HashMap<String, u64>,
    pub active_users_this_hour: u64,
    /// Most recent first
    pub recent_posts: Vec<RecentPost>,
    pub processing: LatencyStats,
}

impl StatsSnapshot {
    /// Posts in the trailing hour: sum of completed minutes.
    pub fn posts_last_hour(&self) -> u64 {
        self.posts_per_minute.iter().sum()
    }

    pub fn top_domains(&self, k: usize) -> Vec<(String, u64)> {
        top_k(&self.popular_domains, k)
    }

    pub fn top_media_types(&self, k: usize) -> Vec<(String, u64)> {
        top_k(&self.media_types, k)
    }

    pub fn top_hashtags(&self, k: usize) -> Vec<(String, u64)> {
        top_k(&self.hashtag_stats, k)
    }

    pub fn top_authors(&self, k: usize) -> Vec<(String, u64)> {
        top_k(&self.most_active_users, k)
    }
}

/// Descending-by-count top-k over a frequency map.
///
/// Ties fall in map-iteration order, which is unspecified; acceptable for
/// a display-only ranking.
fn top_k(map: &HashMap<String, u64>, k: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> =
        map.iter().map(|(key, count)| (key.clone(), *count)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(k);
    entries
}

/// Summary of the processing-latency sample window.
#[derive(Debug, Clone, Default)]
pub struct LatencyStats {
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub samples: usize,
}

impl LatencyStats {
    fn from_samples(samples: &VecDeque<Duration>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let total: Duration = samples.iter().sum();
        let min = samples.iter().min().copied().unwrap_or_default();
        let max = samples.iter().max().copied().unwrap_or_default();
        Self {
            avg_ms: total.as_secs_f64() * 1000.0 / samples.len() as f64,
            min_ms: min.as_secs_f64() * 1000.0,
            max_ms: max.as_secs_f64() * 1000.0,
            samples: samples.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_for(author: &str) -> EventStats {
        EventStats {
            author: author.to_string(),
            text: format!("post by {author}"),
            ..Default::default()
        }
    }

    #[test]
    fn test_minute_rollover_after_61_seconds() {
        let mut engine = StatsEngine::new(1000);

        engine.record_event(1000, event_for("did:a"));
        engine.advance_windows(1000);
        assert_eq!(engine.snapshot(1000).posts_per_minute.len(), 0);

        // 61 seconds later: the first minute is frozen into history
        engine.record_event(1061, event_for("did:b"));
        engine.advance_windows(1061);

        let snap = engine.snapshot(1061);
        assert_eq!(snap.posts_per_minute, vec![2]);
        assert_eq!(snap.posts_this_minute, 0);
    }

    #[test]
    fn test_minute_history_is_bounded() {
        let mut engine = StatsEngine::new(0);
        let mut now = 0;
        for _ in 0..(MINUTE_HISTORY_LEN + 10) {
            now += 60;
            engine.record_event(now, event_for("did:a"));
            engine.advance_windows(now);
        }
        assert_eq!(
            engine.snapshot(now).posts_per_minute.len(),
            MINUTE_HISTORY_LEN
        );
    }

    #[test]
    fn test_hour_rollover_sums_minutes_and_clears_active_set() {
        let mut engine = StatsEngine::new(0);
        let mut now = 0;
        for i in 0..60 {
            now = i * 60 + 60;
            engine.record_event(now, event_for(&format!("did:{i}")));
            engine.advance_windows(now);
        }
        // Cross the hour boundary
        engine.record_event(3601, event_for("did:late"));
        engine.advance_windows(3601);

        let snap = engine.snapshot(3601);
        assert_eq!(snap.posts_per_hour.len(), 1);
        assert!(snap.posts_per_hour[0] > 0);
        // Set was cleared at the rollover; only the post-rollover author
        // is active now
        assert_eq!(snap.active_users_this_hour, 1);
    }

    #[test]
    fn test_no_rollover_during_silence() {
        let mut engine = StatsEngine::new(0);
        engine.record_event(10, event_for("did:a"));
        engine.advance_windows(10);
        // No events for a long time; history only grows on arrival
        let snap = engine.snapshot(100_000);
        assert!(snap.posts_per_minute.is_empty());
        assert_eq!(snap.posts_this_minute, 1);
    }

    #[test]
    fn test_recent_posts_ring_newest_first() {
        let mut engine = StatsEngine::new(0);
        for i in 0..7 {
            engine.record_event(i, event_for(&format!("did:{i}")));
        }
        let snap = engine.snapshot(7);
        assert_eq!(snap.recent_posts.len(), RECENT_POSTS_LEN);
        assert_eq!(snap.recent_posts[0].author, "did:6");
        assert_eq!(snap.recent_posts[4].author, "did:2");
    }

    #[test]
    fn test_unknown_domain_never_counted() {
        let mut engine = StatsEngine::new(0);
        let mut event = event_for("did:a");
        event.has_links = true;
        event.link_domains = vec!["unknown".to_string(), "example.com".to_string()];
        engine.record_event(0, event);

        let snap = engine.snapshot(0);
        assert_eq!(snap.posts_with_links, 1);
        assert_eq!(snap.popular_domains.get("example.com"), Some(&1));
        assert!(!snap.popular_domains.contains_key("unknown"));
    }

    #[test]
    fn test_hashtags_lowercased_for_aggregation() {
        let mut engine = StatsEngine::new(0);
        let mut event = event_for("did:a");
        event.hashtags = vec!["Rust".to_string(), "rust".to_string()];
        engine.record_event(0, event);
        assert_eq!(engine.snapshot(0).hashtag_stats.get("rust"), Some(&2));
    }

    #[test]
    fn test_latency_window_bounded_fifo() {
        let mut engine = StatsEngine::new(0);
        for i in 0..(LATENCY_SAMPLES_LEN + 5) {
            engine.record_latency(Duration::from_micros(i as u64));
        }
        let stats = engine.snapshot(0).processing;
        assert_eq!(stats.samples, LATENCY_SAMPLES_LEN);
        // Oldest five samples were evicted
        assert!(stats.min_ms >= Duration::from_micros(5).as_secs_f64() * 1000.0);
    }

    #[test]
    fn test_top_k_descending() {
        let mut engine = StatsEngine::new(0);
        for (tag, n) in [("a", 3), ("b", 5), ("c", 1), ("d", 2)] {
            for _ in 0..n {
                let mut event = event_for("did:x");
                event.hashtags = vec![tag.to_string()];
                engine.record_event(0, event);
            }
        }
        let top = engine.snapshot(0).top_hashtags(3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0], ("b".to_string(), 5));
        assert_eq!(top[1], ("a".to_string(), 3));
        assert_eq!(top[2], ("d".to_string(), 2));
    }

    #[test]
    fn test_new_user_increments_total_once() {
        let mut engine = StatsEngine::new(0);
        engine.add_existing_users(10);

        let mut first = event_for("did:a");
        first.is_new_user = true;
        engine.record_event(0, first);
        engine.record_event(1, event_for("did:a"));

        let snap = engine.snapshot(1);
        assert_eq!(snap.total_users, 11);
        assert_eq!(snap.total_posts, 2);
    }
}
