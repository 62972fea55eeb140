use lockdesk_application::LockBatchService;
use lockdesk_core::ClientToken;
use lockdesk_domain::WorkerCount;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub lock_batch_service: LockBatchService,
    pub configured_token: Option<ClientToken>,
    pub default_workers: WorkerCount,
}
