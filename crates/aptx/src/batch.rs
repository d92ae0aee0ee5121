//! Bounded-concurrency download of an id range

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, instrument, warn};

use crate::archive;
use crate::config::{BatchConfig, FetchConfig};
use crate::error::{Error, ErrorKind, Result};
use crate::fetch::{FetchOutcome, Fetcher};
use crate::runlog::{RunLog, Status};

/// Final state of one id
#[derive(Clone, Debug, PartialEq)]
pub enum ItemOutcome {
    /// Archive stored, and extracted into the directory when requested
    Saved {
        archive: PathBuf,
        extracted: Option<PathBuf>,
    },
    NotFound,
    Failed(Error),
}

/// Per-id results of a batch, each list sorted by id
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub saved: Vec<u32>,
    pub not_found: Vec<u32>,
    pub failed: Vec<(u32, Error)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.saved.len() + self.not_found.len() + self.failed.len()
    }

    fn push(&mut self, id: u32, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Saved { .. } => self.saved.push(id),
            ItemOutcome::NotFound => self.not_found.push(id),
            ItemOutcome::Failed(err) => self.failed.push((id, err)),
        }
    }

    fn sort(&mut self) {
        self.saved.sort_unstable();
        self.not_found.sort_unstable();
        self.failed.sort_by_key(|(id, _)| *id);
    }
}

/// Download every id in `batch.ids` with at most `batch.workers` requests in
/// flight. A failing id never stops the others.
#[instrument(skip_all, fields(ids = ?batch.ids, workers = batch.workers))]
pub async fn run(fetch: FetchConfig, batch: &BatchConfig) -> Result<BatchReport> {
    let log = Arc::new(RunLog::open(&batch.log_path)?);
    let fetcher = Arc::new(Fetcher::new(fetch)?.with_log(Arc::clone(&log)));
    let permits = Arc::new(Semaphore::new(batch.workers.max(1)));

    let mut tasks = JoinSet::new();
    let mut pending = HashMap::with_capacity(batch.ids.len());
    for id in batch.ids.clone() {
        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .map_err(|err| Error::detached(ErrorKind::Io, err.to_string()))?;
        let fetcher = Arc::clone(&fetcher);
        let log = Arc::clone(&log);
        let extract = batch.extract;
        let handle = tasks.spawn(async move {
            let outcome = process_item(&fetcher, &log, id, extract).await;
            drop(permit);
            outcome
        });
        pending.insert(handle.id(), id);
    }

    let mut report = BatchReport::default();
    while let Some(joined) = tasks.join_next_with_id().await {
        match joined {
            Ok((task, outcome)) => {
                if let Some(id) = pending.remove(&task) {
                    report.push(id, outcome);
                }
            }
            Err(err) => match pending.remove(&err.id()) {
                Some(id) => {
                    let name = fetcher.config().file_name(id);
                    report.push(id, task_failure(&log, &name, &err).await);
                }
                None => warn!("download task aborted: {err}"),
            },
        }
    }
    report.sort();

    info!(
        saved = report.saved.len(),
        not_found = report.not_found.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(report)
}

/// Fetch one id and optionally unpack it, folding every failure into the
/// returned outcome
pub async fn process_item(
    fetcher: &Fetcher,
    log: &Arc<RunLog>,
    id: u32,
    extract: bool,
) -> ItemOutcome {
    let archive_path = match fetcher.fetch(id).await {
        Ok(FetchOutcome::Saved(path)) => path,
        Ok(FetchOutcome::NotFound) => return ItemOutcome::NotFound,
        Err(err) => return ItemOutcome::Failed(err),
    };

    if !extract {
        return ItemOutcome::Saved {
            archive: archive_path,
            extracted: None,
        };
    }

    let out_dir = fetcher.config().out_dir.clone();
    let source = archive_path.clone();
    let extracted = tokio::task::spawn_blocking(move || archive::extract(&source, &out_dir))
        .await
        .map_err(|err| Error::detached(ErrorKind::Io, err.to_string()))
        .and_then(|result| result);

    match extracted {
        Ok(dir) => ItemOutcome::Saved {
            archive: archive_path,
            extracted: Some(dir),
        },
        Err(err) => {
            let name = fetcher.config().file_name(id);
            warn!("failed to extract {name}: {err}");
            record_error(log, &name, &err).await;
            ItemOutcome::Failed(err)
        }
    }
}

/// Outcome for an id whose task panicked or was cancelled
async fn task_failure(log: &Arc<RunLog>, name: &str, err: &JoinError) -> ItemOutcome {
    let err = Error::detached(ErrorKind::Io, format!("download task failed: {err}"));
    warn!("{name}: {err}");
    record_error(log, name, &err).await;
    ItemOutcome::Failed(err)
}

async fn record_error(log: &Arc<RunLog>, name: &str, err: &Error) {
    let message = format!("{name}: {err}");
    if let Err(log_err) = Arc::clone(log).record_async(Status::Err, message).await {
        warn!("failed to write {}: {log_err}", log.path().display());
    }
}
