//! Append-only run log shared by concurrent download tasks
//!
//! Every entry is written as one newline-terminated line with a single
//! `write_all` while holding the writer lock, so entries from different
//! tasks never interleave. Async callers go through [`RunLog::record_async`],
//! which moves the file write onto the blocking pool.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::{Error, ErrorKind, Result};

/// Outcome tag written at the start of an entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// File downloaded and stored
    Ok,
    /// Server answered with an error page
    No,
    /// Request or post-processing failed
    Err,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Err => "ERR",
        };
        f.write_str(tag)
    }
}

/// Process-wide run log
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl RunLog {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `"<date> <time>\t <STATUS> <message>"`
    pub fn record(&self, status: Status, message: &str) -> Result<()> {
        self.append(&format!("{status} {message}"))
    }

    /// [`RunLog::record`] on the blocking thread pool
    pub async fn record_async(self: Arc<Self>, status: Status, message: String) -> Result<()> {
        tokio::task::spawn_blocking(move || self.record(status, &message))
            .await
            .map_err(|err| Error::detached(ErrorKind::Io, err.to_string()))?
    }

    /// Append one timestamped line
    pub fn append(&self, message: &str) -> Result<()> {
        let line = format!("{}\t {}\n", timestamp(), message.trim_end_matches('\n'));
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// Local wall-clock time as `YYYY/MM/DD HH:MM:SS`, UTC when the local offset
/// cannot be determined
fn timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!(
        "[year]/[month]/[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
