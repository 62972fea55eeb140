use std::env;
use std::fmt::Display;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use lockdesk_core::{AppError, ClientToken, configured_client_token};
use lockdesk_domain::{IdentifierQuoting, WorkerCount};
use tracing_subscriber::EnvFilter;

const DEFAULT_API_BASE_URL: &str = "https://wallet.goonus.io/api";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryProviderConfig {
    Http,
    DryRun,
}

impl DirectoryProviderConfig {
    /// Parses `LOCKDESK_DIRECTORY`; an unset or blank value selects HTTP.
    pub fn from_setting(value: Option<&str>) -> Result<Self, AppError> {
        match value.map(str::trim).unwrap_or_default() {
            "" | "http" => Ok(Self::Http),
            "dry-run" => Ok(Self::DryRun),
            other => Err(AppError::Validation(format!(
                "LOCKDESK_DIRECTORY must be either 'http' or 'dry-run', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub api_host: String,
    pub api_port: u16,
    pub api_base_url: String,
    pub configured_token: Option<ClientToken>,
    pub quoting: IdentifierQuoting,
    pub request_timeout: Duration,
    pub directory_provider: DirectoryProviderConfig,
    pub max_upload_bytes: usize,
    pub default_workers: WorkerCount,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parse_env("API_PORT", 8501_u16)?;

        let api_base_url = optional_non_empty_env("LOCKDESK_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());

        let configured_token = load_configured_token()?;

        let quoting = IdentifierQuoting::from_setting(
            optional_non_empty_env("LOCKDESK_ID_QUOTING")
                .as_deref()
                .unwrap_or("apostrophe"),
            parse_env("LOCKDESK_ID_QUOTE_THRESHOLD", IdentifierQuoting::DEFAULT_THRESHOLD)?,
        )?;

        let request_timeout =
            Duration::from_secs(parse_env("LOCKDESK_REQUEST_TIMEOUT_SECONDS", 10_u64)?.max(1));

        let directory_provider = DirectoryProviderConfig::from_setting(
            optional_non_empty_env("LOCKDESK_DIRECTORY").as_deref(),
        )?;

        let max_upload_bytes =
            parse_env("LOCKDESK_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?.max(1);
        let default_workers =
            WorkerCount::new(parse_env("LOCKDESK_WORKERS", WorkerCount::DEFAULT)?)?;

        Ok(Self {
            api_host,
            api_port,
            api_base_url,
            configured_token,
            quoting,
            request_timeout,
            directory_provider,
            max_upload_bytes,
            default_workers,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_configured_token() -> Result<Option<ClientToken>, AppError> {
    let secret_file = optional_non_empty_env("ACCESS_CLIENT_TOKEN_FILE")
        .map(|path| {
            fs::read_to_string(&path).map_err(|error| {
                AppError::Validation(format!(
                    "ACCESS_CLIENT_TOKEN_FILE '{path}' could not be read: {error}"
                ))
            })
        })
        .transpose()?;
    let environment = optional_non_empty_env("ACCESS_CLIENT_TOKEN");

    configured_client_token(secret_file.as_deref(), environment.as_deref())
}

fn optional_non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_env<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    parse_setting(name, optional_non_empty_env(name).as_deref(), default)
}

fn parse_setting<T>(name: &str, value: Option<&str>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: Display,
{
    match value {
        Some(value) => value
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
        None => Ok(default),
    }
}
