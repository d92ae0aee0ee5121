//! Proposal download by id

use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};

use crate::config::FetchConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::runlog::{RunLog, Status};

/// Leading text of the page the endpoint serves for unknown ids
pub const ERROR_PAGE_MARKER: &str = "<!DOCTYPE HTML";

/// What a response body turned out to be
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseClass {
    Content,
    ErrorPage,
}

/// Result of a completed request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Body stored at the given path
    Saved(PathBuf),
    /// Server answered with an error page, nothing was written
    NotFound,
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Saved(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Saved(path) => Some(path),
            Self::NotFound => None,
        }
    }
}

/// Decide whether a successful response carries a proposal file or an error
/// page.
///
/// HTML content types are error pages, as is any body that starts with
/// [`ERROR_PAGE_MARKER`] once decoded. Non-success statuses never reach this
/// point; they are transport failures.
pub fn classify_response(content_type: Option<&str>, body: &[u8]) -> ResponseClass {
    let html = content_type
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/html"));
    if html {
        return ResponseClass::ErrorPage;
    }
    if looks_like_error_page(body) {
        return ResponseClass::ErrorPage;
    }
    ResponseClass::Content
}

/// Body prefix check, skipping bytes that are not valid UTF-8
pub fn looks_like_error_page(body: &[u8]) -> bool {
    let head = body.get(..64).unwrap_or(body);
    String::from_utf8_lossy(head)
        .trim_start_matches(char::REPLACEMENT_CHARACTER)
        .starts_with(ERROR_PAGE_MARKER)
}

/// HTTP downloader for proposal archives
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
    log: Option<Arc<RunLog>>,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("aptx/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            config,
            log: None,
        })
    }

    /// Record every attempt in `log`
    #[must_use]
    pub fn with_log(mut self, log: Arc<RunLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Download proposal `id` into the configured output directory.
    ///
    /// Transport failures are returned as errors so callers can retry them;
    /// an error page from the server is a successful [`FetchOutcome::NotFound`].
    #[instrument(skip(self))]
    pub async fn fetch(&self, id: u32) -> Result<FetchOutcome> {
        let name = self.config.file_name(id);
        let result = self.try_fetch(id).await;

        match &result {
            Ok(FetchOutcome::Saved(path)) => {
                info!("OK {name} -> {}", path.display());
                self.log_attempt(Status::Ok, name).await;
            }
            Ok(FetchOutcome::NotFound) => {
                info!("NO {name}");
                self.log_attempt(Status::No, name).await;
            }
            Err(err) => {
                warn!("ERR {name}: {err}");
                self.log_attempt(Status::Err, format!("{name}: {err}")).await;
            }
        }

        result
    }

    /// Download proposal `id`, reducing the outcome to whether a file was saved
    pub async fn download(&self, id: u32) -> bool {
        matches!(self.fetch(id).await, Ok(outcome) if outcome.is_ok())
    }

    async fn try_fetch(&self, id: u32) -> Result<FetchOutcome> {
        let url = self.config.url(id);
        debug!("GET {url}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(status_error(&url, status));
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        match classify_response(content_type.as_deref(), &body) {
            ResponseClass::ErrorPage => {
                debug!("error page for {url}");
                Ok(FetchOutcome::NotFound)
            }
            ResponseClass::Content => {
                let path = self.config.target_path(id);
                store(&path, &body).await?;
                Ok(FetchOutcome::Saved(path))
            }
        }
    }

    async fn log_attempt(&self, status: Status, message: String) {
        if let Some(log) = &self.log {
            if let Err(err) = Arc::clone(log).record_async(status, message).await {
                warn!("failed to write {}: {err}", log.path().display());
            }
        }
    }
}

/// A non-success status may clear up on retry, unlike an error page
fn status_error(url: &str, status: StatusCode) -> Error {
    Error::detached(ErrorKind::Transport, format!("GET {url} returned {status}"))
}

async fn store(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, body).await?;
    Ok(())
}
