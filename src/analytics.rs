//! Final aggregate export
//!
//! At shutdown, after the write queue has drained, the last snapshot is
//! serialized to a timestamped JSON file. The aggregate is otherwise
//! transient; nothing is persisted on a rolling basis.

use {
    crate::stats::StatsSnapshot,
    chrono::Utc,
    serde::Serialize,
    std::{
        collections::HashMap,
        fs,
        path::{Path, PathBuf},
    },
};

#[derive(Debug, Serialize)]
struct AnalyticsExport<'a> {
    runtime_seconds: i64,
    total_posts: u64,
    total_users: u64,
    popular_domains: &'a HashMap<String, u64>,
    media_types: &'a HashMap<String, u64>,
    hashtag_stats: &'a HashMap<String, u64>,
    most_active_users: &'a HashMap<String, u64>,
}

/// Write the final aggregate to `<data-dir>/analytics/analytics_<ts>.json`.
pub fn export_final(
    snapshot: &StatsSnapshot,
    data_dir: &Path,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let analytics_dir = data_dir.join("analytics");
    fs::create_dir_all(&analytics_dir)?;

    let export = AnalyticsExport {
        runtime_seconds: snapshot.runtime_seconds,
        total_posts: snapshot.total_posts,
        total_users: snapshot.total_users,
        popular_domains: &snapshot.popular_domains,
        media_types: &snapshot.media_types,
        hashtag_stats: &snapshot.hashtag_stats,
        most_active_users: &snapshot.most_active_users,
    };

    let path = analytics_dir.join(format!("analytics_{}.json", Utc::now().timestamp()));
    let json = serde_json::to_string_pretty(&export)?;
    fs::write(&path, json)?;

    log::info!("Exported final analytics to {}", path.display());
    Ok(path)
}
