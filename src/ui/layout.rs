use {
    crate::stats::StatsSnapshot,
    ratatui::{
        layout::{Constraint, Direction, Layout as RatLayout, Rect},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Block, Borders, Paragraph, Row, Table},
        Frame,
    },
};

/// Render the main UI layout
pub fn render_layout(f: &mut Frame, snapshot: &StatsSnapshot) {
    let chunks = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main area
            Constraint::Length(3), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], snapshot);

    let main = RatLayout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(2, 5), Constraint::Ratio(3, 5)])
        .split(chunks[1]);

    let left = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)])
        .split(main[0]);

    render_metrics(f, left[0], snapshot);
    render_performance(f, left[1], snapshot);

    let right = RatLayout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)])
        .split(main[1]);

    render_recent_posts(f, right[0], snapshot);
    render_analytics(f, right[1], snapshot);

    render_footer(f, chunks[2], snapshot);
}

fn render_header(f: &mut Frame, area: Rect, snapshot: &StatsSnapshot) {
    let runtime = format_runtime(snapshot.runtime_seconds);
    let text = vec![Line::from(vec![
        Span::styled(
            "Bluesky Firehose Monitor",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " | Runtime: {} | Active Users: {} | Posts/min: {}",
            runtime, snapshot.active_users_this_hour, snapshot.posts_this_minute
        )),
    ])];

    let block = Block::default().borders(Borders::ALL);
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn render_metrics(f: &mut Frame, area: Rect, snapshot: &StatsSnapshot) {
    let header = Row::new(vec!["Metric", "Last Minute", "Last Hour", "Total"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let total = snapshot.total_posts.max(1) as f64;
    let rows = vec![
        Row::new(vec![
            "Posts".to_string(),
            snapshot.posts_this_minute.to_string(),
            snapshot.posts_last_hour().to_string(),
            snapshot.total_posts.to_string(),
        ]),
        Row::new(vec![
            "Users".to_string(),
            snapshot.active_users_this_hour.to_string(),
            "-".to_string(),
            snapshot.total_users.to_string(),
        ]),
        Row::new(vec![
            "Media Posts".to_string(),
            snapshot.posts_with_images.to_string(),
            "-".to_string(),
            format!("{:.1}%", snapshot.posts_with_images as f64 / total * 100.0),
        ]),
        Row::new(vec![
            "Posts with Links".to_string(),
            snapshot.posts_with_links.to_string(),
            "-".to_string(),
            format!("{:.1}%", snapshot.posts_with_links as f64 / total * 100.0),
        ]),
    ];

    let widths = [
        Constraint::Length(18),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Metrics Overview"));
    f.render_widget(table, area);
}

fn render_performance(f: &mut Frame, area: Rect, snapshot: &StatsSnapshot) {
    let p = &snapshot.processing;
    let text = vec![
        Line::from(format!(
            "Processing (ms)  avg: {:.2}  min: {:.2}  max: {:.2}",
            p.avg_ms, p.min_ms, p.max_ms
        )),
        Line::from(format!("Latency samples: {}", p.samples)),
    ];

    let block = Block::default().borders(Borders::ALL).title("Performance");
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn render_recent_posts(f: &mut Frame, area: Rect, snapshot: &StatsSnapshot) {
    let block = Block::default().borders(Borders::ALL).title("Recent Activity");

    if snapshot.recent_posts.is_empty() {
        f.render_widget(Paragraph::new("No recent posts").block(block), area);
        return;
    }

    let rows: Vec<Row> = snapshot
        .recent_posts
        .iter()
        .map(|post| {
            Row::new(vec![
                format_clock(post.timestamp),
                truncate(&post.author, 18),
                truncate(&post.text, 50),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(9),
        Constraint::Length(20),
        Constraint::Min(30),
    ];

    f.render_widget(Table::new(rows, widths).block(block), area);
}

fn render_analytics(f: &mut Frame, area: Rect, snapshot: &StatsSnapshot) {
    let header = Row::new(vec!["Category", "Top Items"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows = vec![
        Row::new(vec![
            "Popular Domains".to_string(),
            format_top(&snapshot.top_domains(3), ""),
        ]),
        Row::new(vec![
            "Media Types".to_string(),
            format_top(&snapshot.top_media_types(3), ""),
        ]),
        Row::new(vec![
            "Trending Hashtags".to_string(),
            format_top(&snapshot.top_hashtags(3), "#"),
        ]),
    ];

    let widths = [Constraint::Length(20), Constraint::Min(30)];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Analytics"));
    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, area: Rect, snapshot: &StatsSnapshot) {
    let text = vec![Line::from(vec![
        Span::styled("Status: ", Style::default().fg(Color::Green)),
        Span::raw("Streaming"),
        Span::raw(" | "),
        Span::styled("Posts: ", Style::default().fg(Color::Cyan)),
        Span::raw(snapshot.total_posts.to_string()),
        Span::raw(" | "),
        Span::styled("Users: ", Style::default().fg(Color::Cyan)),
        Span::raw(snapshot.total_users.to_string()),
        Span::raw(" | Press 'q' or Esc to quit"),
    ])];

    let block = Block::default().borders(Borders::ALL).title("Status");
    f.render_widget(Paragraph::new(text).block(block), area);
}

fn format_top(entries: &[(String, u64)], prefix: &str) -> String {
    if entries.is_empty() {
        return "-".to_string();
    }
    entries
        .iter()
        .map(|(name, count)| format!("{}{}: {}", prefix, name, count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_clock(timestamp: i64) -> String {
    use chrono::{DateTime, Utc};
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "N/A".to_string(),
    }
}

fn format_runtime(seconds: i64) -> String {
    format!("{:02}:{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60, seconds % 60)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    } else {
        text.to_string()
    }
}
