use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::PersistedRecord;
use crate::error::SinkError;

/// Append-only destination for accepted frames
#[async_trait]
pub trait PersistenceSink: Send {
    /// Durably append one record. Returns only after the write is flushed.
    async fn append(&mut self, record: &PersistedRecord) -> Result<(), SinkError>;

    /// Release the underlying handle
    async fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Newline-delimited text log, opened in append mode
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

impl FileSink {
    /// Open (or create) the log for appending. Existing lines are kept.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SinkError::Open {
                    path: path.display().to_string(),
                    source,
                })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| SinkError::Open {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PersistenceSink for FileSink {
    async fn append(&mut self, record: &PersistedRecord) -> Result<(), SinkError> {
        let file = self.file.as_mut().ok_or_else(|| {
            SinkError::Write(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "log already closed",
            ))
        })?;

        let line = format!("{}\n", record);
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        Ok(())
    }
}

/// In-memory sink with optional failure injection
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<PersistedRecord>>>,
    failures_remaining: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` appends fail with an I/O error
    pub fn fail_next(&self, count: usize) {
        *self
            .failures_remaining
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = count;
    }

    pub fn records(&self) -> Vec<PersistedRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Rendered log lines, as a file sink would have written them
    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(|r| r.to_string()).collect()
    }
}

#[async_trait]
impl PersistenceSink for MemorySink {
    async fn append(&mut self, record: &PersistedRecord) -> Result<(), SinkError> {
        {
            let mut remaining = self
                .failures_remaining
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SinkError::Write(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "injected write failure",
                )));
            }
        }

        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(*record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SensorFrame;
    use crate::storage::read_records;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_appends_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("data.txt");
        let frame = SensorFrame::new(0, [1; 8], [2; 3], [3; 3]);
        let record = PersistedRecord::from_frame(&frame, false);

        let mut sink = FileSink::open(&path).await.unwrap();
        sink.append(&record).await.unwrap();
        sink.close().await.unwrap();

        let mut sink = FileSink::open(&path).await.unwrap();
        sink.append(&record).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(read_records(&path).unwrap(), vec![record, record]);
    }

    #[tokio::test]
    async fn test_append_after_close_fails() {
        let dir = tempdir().unwrap();
        let mut sink = FileSink::open(dir.path().join("data.txt")).await.unwrap();
        sink.close().await.unwrap();

        let record = PersistedRecord::from_frame(&SensorFrame::new(0, [0; 8], [0; 3], [0; 3]), false);
        assert!(sink.append(&record).await.is_err());
    }
}
