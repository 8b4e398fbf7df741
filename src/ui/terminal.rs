use {
    crate::stats::StatsEngine,
    chrono::Utc,
    ratatui::{backend::CrosstermBackend, Terminal},
    std::{sync::Arc, time::Duration},
    tokio::sync::RwLock,
};

/// Run the TUI event loop
///
/// Polls a snapshot of the stats engine at a fixed interval and renders it.
/// 'q' or Esc exits, which triggers pipeline shutdown from the caller.
pub async fn run_ui(
    stats: Arc<RwLock<StatsEngine>>,
    refresh_interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let stdout = std::io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    crossterm::terminal::enable_raw_mode()?;

    // Alternate screen isolates the dashboard from stderr logging
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::cursor::Hide
    )?;

    terminal.clear()?;

    loop {
        // Check for keyboard input (non-blocking, doubles as the refresh timer)
        if crossterm::event::poll(refresh_interval)? {
            if let crossterm::event::Event::Key(key) = crossterm::event::read()? {
                match key.code {
                    crossterm::event::KeyCode::Char('q') | crossterm::event::KeyCode::Esc => {
                        break;
                    }
                    _ => {}
                }
            }
        }

        // Copy out a consistent view, then render without holding the lock
        let snapshot = {
            let stats = stats.read().await;
            stats.snapshot(Utc::now().timestamp())
        };

        terminal.draw(|f| {
            crate::ui::layout::render_layout(f, &snapshot);
        })?;
    }

    // Restore terminal state
    crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    crossterm::terminal::disable_raw_mode()?;
    Ok(())
}
