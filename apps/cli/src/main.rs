//! Lockdesk command line batch runner.

#![forbid(unsafe_code)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lockdesk_application::{AccountDirectory, LockBatchService};
use lockdesk_core::{AppError, AppResult, ClientToken, configured_client_token, resolve_client_token};
use lockdesk_domain::{IdentifierQuoting, LockBatchReport, WorkerCount};
use lockdesk_infrastructure::{
    HttpAccountDirectory, InMemoryAccountDirectory, REPORT_FILE_NAME, read_lock_rows,
    write_lock_report,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_API_BASE_URL: &str = "https://wallet.goonus.io/api";
const USAGE: &str = "usage: lockdesk-cli <input.csv> [output.csv]";

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliArgs {
    input_path: PathBuf,
    output_path: PathBuf,
}

#[derive(Debug, Clone)]
struct CliConfig {
    args: CliArgs,
    api_base_url: String,
    token: ClientToken,
    quoting: IdentifierQuoting,
    request_timeout: Duration,
    dry_run: bool,
    workers: WorkerCount,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = CliConfig::load(env::args().skip(1))?;
    let directory = build_account_directory(&config)?;
    let service = LockBatchService::new(directory, config.quoting);

    info!(
        input = %config.args.input_path.display(),
        output = %config.args.output_path.display(),
        api_base_url = %config.api_base_url,
        token_source = %config.token.source(),
        workers = config.workers.get(),
        dry_run = config.dry_run,
        "lockdesk-cli started"
    );

    let report = run(&service, &config.token, &config.args, config.workers).await?;

    for rejection in &report.rejections {
        warn!(line = rejection.line, row = %rejection.raw, reason = %rejection.reason, "row skipped");
    }
    for diagnostic in &report.diagnostics {
        warn!(
            userid = %diagnostic.userid,
            status = ?diagnostic.status,
            detail = %diagnostic.detail,
            "version lookup failed"
        );
    }

    info!(
        output = %config.args.output_path.display(),
        succeeded = report.succeeded_count(),
        failed = report.failed_count(),
        rejected = report.rejections.len(),
        elapsed_seconds = report.elapsed_seconds(),
        "lock report written"
    );

    Ok(())
}

/// Reads the input file, processes it and writes the report.
async fn run(
    service: &LockBatchService,
    token: &ClientToken,
    args: &CliArgs,
    workers: WorkerCount,
) -> AppResult<LockBatchReport> {
    let contents = fs::read(&args.input_path).map_err(|error| {
        AppError::Validation(format!(
            "failed to read input file '{}': {error}",
            args.input_path.display()
        ))
    })?;
    let rows = read_lock_rows(&contents)?;

    let report = service.run_batch(token, rows, workers).await;

    let csv = write_lock_report(&report.outcomes)?;
    fs::write(&args.output_path, csv).map_err(|error| {
        AppError::Internal(format!(
            "failed to write report '{}': {error}",
            args.output_path.display()
        ))
    })?;

    Ok(report)
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> AppResult<Self> {
        let mut args = args.into_iter();
        let input_path = args
            .next()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| AppError::Validation(USAGE.to_owned()))?;
        let output_path = args
            .next()
            .map(PathBuf::from)
            .unwrap_or_else(|| default_output_path(&input_path));
        if args.next().is_some() {
            return Err(AppError::Validation(USAGE.to_owned()));
        }

        Ok(Self {
            input_path,
            output_path,
        })
    }
}

impl CliConfig {
    fn load(args: impl IntoIterator<Item = String>) -> AppResult<Self> {
        let args = CliArgs::parse(args)?;

        let api_base_url = optional_non_empty_env("LOCKDESK_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        let secret_file = optional_non_empty_env("ACCESS_CLIENT_TOKEN_FILE")
            .map(|path| {
                fs::read_to_string(&path).map_err(|error| {
                    AppError::Validation(format!(
                        "ACCESS_CLIENT_TOKEN_FILE '{path}' could not be read: {error}"
                    ))
                })
            })
            .transpose()?;
        let configured = configured_client_token(
            secret_file.as_deref(),
            optional_non_empty_env("ACCESS_CLIENT_TOKEN").as_deref(),
        )?;
        let token = resolve_client_token(configured.as_ref(), None)?;

        let quoting = IdentifierQuoting::from_setting(
            optional_non_empty_env("LOCKDESK_ID_QUOTING")
                .as_deref()
                .unwrap_or("apostrophe"),
            parse_env_usize("LOCKDESK_ID_QUOTE_THRESHOLD", IdentifierQuoting::DEFAULT_THRESHOLD)?,
        )?;
        let request_timeout =
            Duration::from_secs(parse_env_u64("LOCKDESK_REQUEST_TIMEOUT_SECONDS", 10)?.max(1));

        let dry_run = parse_dry_run(optional_non_empty_env("LOCKDESK_DIRECTORY").as_deref())?;

        let workers = WorkerCount::new(parse_env_usize("LOCKDESK_WORKERS", WorkerCount::DEFAULT)?)?;

        Ok(Self {
            args,
            api_base_url,
            token,
            quoting,
            request_timeout,
            dry_run,
            workers,
        })
    }
}

fn build_account_directory(config: &CliConfig) -> AppResult<Arc<dyn AccountDirectory>> {
    if config.dry_run {
        warn!("dry-run directory in use, no lock request leaves this process");
        return Ok(Arc::new(InMemoryAccountDirectory::dry_run()));
    }

    let http_client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    Ok(Arc::new(
        HttpAccountDirectory::new(http_client, &config.api_base_url)?
            .with_request_timeout(config.request_timeout),
    ))
}

fn parse_dry_run(directory: Option<&str>) -> AppResult<bool> {
    match directory.map(str::trim).unwrap_or_default() {
        "" | "http" => Ok(false),
        "dry-run" => Ok(true),
        other => Err(AppError::Validation(format!(
            "LOCKDESK_DIRECTORY must be either 'http' or 'dry-run', got '{other}'"
        ))),
    }
}

fn default_output_path(input_path: &Path) -> PathBuf {
    input_path.with_file_name(REPORT_FILE_NAME)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn optional_non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env_usize(name: &str, default: usize) -> AppResult<usize> {
    match optional_non_empty_env(name) {
        Some(value) => value.parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match optional_non_empty_env(name) {
        Some(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
