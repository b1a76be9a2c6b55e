//! Append-only results log.
//!
//! Every write opens the log in append mode, writes one complete entry with a
//! single `write_all`, flushes and closes the file, all while holding the
//! sink's lock. Entries from concurrent workers therefore never interleave.

use crate::error::ScanError;
use crate::types::FindingRecord;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// `ctime`-style timestamp used in session markers, e.g. `Sun Oct 18 12:04:05 2026`.
const MARKER_TIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Serialized writer for one results log.
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ResultSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one finding.
    pub async fn append(&self, record: &FindingRecord) -> Result<(), ScanError> {
        debug!(domain = %record.domain, reason = %record.reason(), "writing finding");
        self.write_entry(&format_record(record)).await
    }

    /// Append a free-form marker line (session start/end).
    pub async fn append_marker(&self, text: &str) -> Result<(), ScanError> {
        let mut line = text.trim_end_matches('\n').to_string();
        line.push('\n');
        self.write_entry(&line).await
    }

    /// Marker written when a session starts loading candidates.
    pub async fn session_started(&self, base_domain: &str) -> Result<(), ScanError> {
        self.append_marker(&session_marker(Local::now(), "Starting verification for", base_domain))
            .await
    }

    /// Marker written once the queue has drained.
    pub async fn session_completed(&self, base_domain: &str) -> Result<(), ScanError> {
        self.append_marker(&session_marker(Local::now(), "Verification completed for", base_domain))
            .await
    }

    async fn write_entry(&self, entry: &str) -> Result<(), ScanError> {
        let _guard = self.lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.file_error("Failed to open results log", e))?;

        file.write_all(entry.as_bytes())
            .await
            .map_err(|e| self.file_error("Failed to write results log", e))?;
        file.flush()
            .await
            .map_err(|e| self.file_error("Failed to flush results log", e))?;

        Ok(())
    }

    fn file_error(&self, context: &str, err: std::io::Error) -> ScanError {
        ScanError::file_error(self.path.to_string_lossy(), format!("{}: {}", context, err))
    }
}

/// Render a finding the way it appears in the log:
///
/// ```text
/// example.com -> IP found: 93.184.216.34
/// WHOIS:
/// <raw registry text>
/// ```
pub fn format_record(record: &FindingRecord) -> String {
    format!(
        "{} -> {}\nWHOIS:\n{}\n",
        record.domain,
        record.reason(),
        record.raw_registry_text
    )
}

pub fn session_marker(at: DateTime<Local>, action: &str, base_domain: &str) -> String {
    format!("{} - {} {}", at.format(MARKER_TIME_FORMAT), action, base_domain)
}
