//! Event source seam
//!
//! The live firehose subscription and block decoding live outside this
//! crate; anything that can yield decoded [`PostEvent`]s one at a time can
//! drive the pipeline. The bundled [`JsonlSource`] replays records from a
//! JSONL capture for local runs and tests.

use crate::event::PostEvent;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

#[derive(Debug)]
pub enum SourceError {
    Io(std::io::Error),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SourceError {}

/// Anything that delivers decoded post records one at a time.
///
/// `Ok(None)` means the stream is exhausted. No delivery-order guarantee
/// across authors and no re-delivery on handler failure.
#[async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Result<Option<PostEvent>, SourceError>;
}

/// Replays post records from a JSONL file, one JSON object per line.
pub struct JsonlSource {
    lines: Lines<BufReader<File>>,
}

impl JsonlSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let file = File::open(path.as_ref()).await?;
        log::info!("Replaying events from {}", path.as_ref().display());
        Ok(Self {
            lines: BufReader::new(file).lines(),
        })
    }
}

#[async_trait]
impl EventSource for JsonlSource {
    async fn next_event(&mut self) -> Result<Option<PostEvent>, SourceError> {
        while let Some(line) = self.lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<PostEvent>(&line) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    // Undecodable line: skip it, the stream goes on
                    log::warn!("Skipping malformed record: {}", e);
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_jsonl_replay_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"author":"did:a","text":"one"}}"#).unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"author":"did:b","text":"two"}}"#).unwrap();
        file.flush().unwrap();

        let mut source = JsonlSource::open(file.path()).await.unwrap();
        assert_eq!(source.next_event().await.unwrap().unwrap().author, "did:a");
        assert_eq!(source.next_event().await.unwrap().unwrap().author, "did:b");
        assert!(source.next_event().await.unwrap().is_none());
    }
}
