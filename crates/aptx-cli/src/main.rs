use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use aptx::config::{
    DEFAULT_BASE_URL, DEFAULT_EXTENSION, DEFAULT_IDS, DEFAULT_LOG_FILE, DEFAULT_WORKERS,
};
use aptx::convert::convert_file;
use aptx::{BatchConfig, ConvertOptions, FetchConfig, FetchOutcome, Fetcher, RunLog};

#[derive(Debug, Parser)]
#[command(
    name = "aptx",
    version,
    about = "Download JWST APT proposals and convert their XML to JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download a single proposal archive
    Fetch {
        id: u32,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Download a range of proposal ids concurrently
    Batch {
        /// First id (inclusive)
        #[arg(long, default_value_t = DEFAULT_IDS.start)]
        start: u32,
        /// Last id (exclusive)
        #[arg(long, default_value_t = DEFAULT_IDS.end)]
        end: u32,
        /// Concurrent downloads
        #[arg(short, long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,
        /// Unpack every downloaded archive
        #[arg(long)]
        extract: bool,
        #[command(flatten)]
        remote: RemoteArgs,
    },
    /// Unpack an archive into `<DIR>/<name without extensions>`
    Extract {
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
        /// Parent directory for the extracted files
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },
    /// Convert an XML file to indented JSON
    Convert {
        #[arg(value_name = "XML")]
        input: PathBuf,
        /// Output file (defaults to the input with a .json extension)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
        /// Fail on repeated keys and mixed lists instead of keeping the last value
        #[arg(long)]
        strict: bool,
    },
    /// Download, unpack and convert one proposal
    Process {
        id: u32,
        #[command(flatten)]
        remote: RemoteArgs,
    },
}

#[derive(Debug, Args)]
struct RemoteArgs {
    /// URL prefix the archives are served from
    #[arg(long, env = "APTX_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Directory downloads are written to
    #[arg(short = 'd', long, env = "APTX_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,
    /// Append-only run log
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log: PathBuf,
}

impl RemoteArgs {
    fn fetch_config(&self) -> FetchConfig {
        FetchConfig::default()
            .with_base_url(self.base_url.clone())
            .with_out_dir(self.out_dir.clone())
            .with_timeout(Duration::from_secs(self.timeout))
    }

    fn fetcher(&self) -> Result<Fetcher> {
        let log = RunLog::open(&self.log)
            .with_context(|| format!("failed to open run log {}", self.log.display()))?;
        let fetcher = Fetcher::new(self.fetch_config()).context("failed to build HTTP client")?;
        Ok(fetcher.with_log(Arc::new(log)))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Fetch { id, remote } => {
            let path = runtime()?.block_on(fetch(id, &remote))?;
            println!("{}", path.display());
        }
        Command::Batch {
            start,
            end,
            workers,
            extract,
            remote,
        } => {
            if start > end {
                bail!("--start ({start}) must not exceed --end ({end})");
            }
            let batch = BatchConfig::new(start..end, workers)
                .with_log_path(remote.log.clone())
                .with_extract(extract);
            let report = runtime()?
                .block_on(aptx::batch::run(remote.fetch_config(), &batch))
                .context("batch download failed")?;
            for (id, err) in &report.failed {
                error!("{id}.{DEFAULT_EXTENSION}: {err}");
            }
            println!(
                "saved {}, not found {}, failed {}",
                report.saved.len(),
                report.not_found.len(),
                report.failed.len()
            );
        }
        Command::Extract { archive, output } => {
            let dir = aptx::extract(&archive, &output)
                .with_context(|| format!("failed to extract {}", archive.display()))?;
            println!("{}", dir.display());
        }
        Command::Convert {
            input,
            output,
            strict,
        } => {
            let output = output.unwrap_or_else(|| input.with_extension("json"));
            convert(&input, &output, strict)?;
            println!("{}", output.display());
        }
        Command::Process { id, remote } => {
            let archive = runtime()?.block_on(fetch(id, &remote))?;
            let dir = aptx::extract(&archive, &remote.out_dir)
                .with_context(|| format!("failed to extract {}", archive.display()))?;
            let xml = dir.join(format!("{id}.xml"));
            let json = remote.out_dir.join(format!("{id}.json"));
            convert(&xml, &json, false)?;
            println!("{}", json.display());
        }
    }
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

async fn fetch(id: u32, remote: &RemoteArgs) -> Result<PathBuf> {
    let fetcher = remote.fetcher()?;
    match fetcher.fetch(id).await? {
        FetchOutcome::Saved(path) => Ok(path),
        FetchOutcome::NotFound => bail!("proposal {id} is not available"),
    }
}

fn convert(input: &Path, output: &Path, strict: bool) -> Result<()> {
    let options = if strict {
        ConvertOptions::strict()
    } else {
        ConvertOptions::default()
    };
    info!("Converting {} -> {}", input.display(), output.display());
    convert_file(input, output, options)
        .with_context(|| format!("failed to convert {}", input.display()))?;
    Ok(())
}
