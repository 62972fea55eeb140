//! Lockdesk API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod state;
mod views;

use std::sync::Arc;

use lockdesk_application::{AccountDirectory, LockBatchService};
use lockdesk_core::AppError;
use lockdesk_infrastructure::{HttpAccountDirectory, InMemoryAccountDirectory};
use tracing::{info, warn};

use crate::api_config::{ApiConfig, DirectoryProviderConfig, init_tracing};
use crate::api_router::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;
    let directory = build_account_directory(&config)?;

    let app_state = AppState {
        lock_batch_service: LockBatchService::new(directory, config.quoting),
        configured_token: config.configured_token.clone(),
        default_workers: config.default_workers,
    };
    let app = build_router(app_state, config.max_upload_bytes);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(
        %address,
        directory = ?config.directory_provider,
        token_source = config
            .configured_token
            .as_ref()
            .map_or("form", |token| token.source().as_str()),
        quoting = config.quoting.as_str(),
        "lockdesk-api listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn build_account_directory(config: &ApiConfig) -> Result<Arc<dyn AccountDirectory>, AppError> {
    match config.directory_provider {
        DirectoryProviderConfig::Http => {
            let http_client = reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build http client: {error}"))
                })?;

            Ok(Arc::new(
                HttpAccountDirectory::new(http_client, &config.api_base_url)?
                    .with_request_timeout(config.request_timeout),
            ))
        }
        DirectoryProviderConfig::DryRun => {
            warn!("dry-run directory in use, no lock request leaves this process");
            Ok(Arc::new(InMemoryAccountDirectory::dry_run()))
        }
    }
}
