//! Download and batch configuration

use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

/// Public APT proposal endpoint
pub const DEFAULT_BASE_URL: &str = "https://www.stsci.edu/jwst/phase2-public";
/// Extension of proposal archives
pub const DEFAULT_EXTENSION: &str = "aptx";
/// Run log file name
pub const DEFAULT_LOG_FILE: &str = "run.log";
/// Proposal ids scanned by a default batch
pub const DEFAULT_IDS: Range<u32> = 0..3000;
/// Concurrent downloads in a default batch
pub const DEFAULT_WORKERS: usize = 6;

/// Configuration for [`crate::fetch::Fetcher`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchConfig {
    /// URL prefix; the request goes to `{base_url}/{id}.{extension}`
    pub base_url: String,
    pub extension: String,
    /// Directory downloaded files are written to
    pub out_dir: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            out_dir: PathBuf::from("."),
            timeout: Duration::from_secs(60),
        }
    }
}

impl FetchConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `<id>.<extension>`
    pub fn file_name(&self, id: u32) -> String {
        format!("{id}.{}", self.extension)
    }

    pub fn url(&self, id: u32) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.file_name(id))
    }

    pub fn target_path(&self, id: u32) -> PathBuf {
        self.out_dir.join(self.file_name(id))
    }
}

/// Configuration for [`crate::batch::run`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    pub ids: Range<u32>,
    /// Maximum downloads in flight (at least one is always allowed)
    pub workers: usize,
    pub log_path: PathBuf,
    /// Unpack each downloaded archive next to it
    pub extract: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            ids: DEFAULT_IDS,
            workers: DEFAULT_WORKERS,
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            extract: false,
        }
    }
}

impl BatchConfig {
    pub fn new(ids: Range<u32>, workers: usize) -> Self {
        Self {
            ids,
            workers,
            ..Self::default()
        }
    }

    pub fn with_log_path(mut self, log_path: impl Into<PathBuf>) -> Self {
        self.log_path = log_path.into();
        self
    }

    pub fn with_extract(mut self, extract: bool) -> Self {
        self.extract = extract;
        self
    }
}
