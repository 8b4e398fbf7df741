//! Single-consumer write queue for per-author table files
//!
//! All physical appends for one store flow through one task, so two tasks
//! targeting the same file are applied in submission order and rows are
//! never interleaved. A `Shutdown` message is the poison pill: the consumer
//! drains everything enqueued before it, then exits, and the resolved join
//! handle is the flush guarantee.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum WriterError {
    Io(std::io::Error),
    ChannelClosed,
}

impl From<std::io::Error> for WriterError {
    fn from(err: std::io::Error) -> Self {
        WriterError::Io(err)
    }
}

impl std::fmt::Display for WriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterError::Io(e) => write!(f, "IO error: {}", e),
            WriterError::ChannelClosed => write!(f, "write queue closed"),
        }
    }
}

impl std::error::Error for WriterError {}

/// One pending append. Immutable once enqueued.
#[derive(Debug, Clone)]
pub struct WriteTask {
    pub path: PathBuf,
    pub row: Vec<String>,
    pub header: &'static [&'static str],
}

/// Message sent through the channel from producers to the writer task.
#[derive(Debug)]
pub enum WriteMessage {
    Task(WriteTask),
    Shutdown,
}

/// Background task that drains the write queue in FIFO order.
///
/// A single task's I/O failure is logged and the task dropped; the consumer
/// keeps going. Per-row durability is best-effort, not transactional.
pub async fn writer_task(mut receiver: mpsc::Receiver<WriteMessage>) {
    log::info!("File writer task started");

    while let Some(message) = receiver.recv().await {
        match message {
            WriteMessage::Task(task) => {
                if let Err(e) = append_row(&task) {
                    log::error!("Failed to write to {}: {}", task.path.display(), e);
                }
            }
            WriteMessage::Shutdown => {
                log::info!("File writer received shutdown signal");
                break;
            }
        }
    }

    log::info!("File writer task stopped");
}

/// Open-or-create the target file, write the header only on creation,
/// then append the row.
fn append_row(task: &WriteTask) -> Result<(), WriterError> {
    let existed = task.path.exists();

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&task.path)?;

    if !existed {
        let header: Vec<String> = task.header.iter().map(|h| h.to_string()).collect();
        writeln!(file, "{}", encode_row(&header))?;
    }
    writeln!(file, "{}", encode_row(&task.row))?;
    file.flush()?;

    Ok(())
}

/// Encode one table row. Fields containing the delimiter, a quote or a line
/// break are wrapped in quotes with embedded quotes doubled.
pub fn encode_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| encode_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn encode_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Parse one encoded table row back into its field values.
///
/// Inverse of [`encode_row`]; used to read tables back for verification.
pub fn parse_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_fields_pass_through() {
        let row = vec!["2024-01-01T00:00:00Z".to_string(), "0".to_string()];
        assert_eq!(encode_row(&row), "2024-01-01T00:00:00Z,0");
    }

    #[test]
    fn test_fields_with_delimiters_are_quoted() {
        let row = vec!["a,b".to_string(), "plain".to_string()];
        assert_eq!(encode_row(&row), "\"a,b\",plain");
    }

    #[test]
    fn test_row_round_trip() {
        let row = vec![
            "2024-01-01T00:00:00Z".to_string(),
            "text with, comma".to_string(),
            "say \"\"hi\"\"".to_string(),
            "".to_string(),
            "3".to_string(),
        ];
        assert_eq!(parse_row(&encode_row(&row)), row);
    }
}
