use async_trait::async_trait;
use lockdesk_core::{AppResult, ClientToken};
use lockdesk_domain::{AccountRef, LockReceipt, LockRequest, VersionToken};

/// Port for the remote user directory that owns account records.
///
/// Failed calls return `AppError::Upstream`, with `status` set whenever the
/// remote side answered.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Reads the current record version of an account.
    ///
    /// Returns `Ok(None)` when the response carries no `user.version`.
    async fn fetch_version(
        &self,
        token: &ClientToken,
        account: &AccountRef,
    ) -> AppResult<Option<VersionToken>>;

    /// Submits a lock for an account. Only a 2xx response is `Ok`.
    async fn submit_lock(
        &self,
        token: &ClientToken,
        account: &AccountRef,
        request: &LockRequest,
    ) -> AppResult<LockReceipt>;
}
