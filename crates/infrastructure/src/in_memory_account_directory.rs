use std::collections::HashMap;

use async_trait::async_trait;
use lockdesk_application::AccountDirectory;
use lockdesk_core::{AppError, AppResult, ClientToken};
use lockdesk_domain::{AccountRef, LockReceipt, LockRequest, VersionToken};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::info;

/// Lock accepted by the in-memory directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedLock {
    /// Identifier as supplied by the operator.
    pub userid: String,
    /// Rendered path segment the request would have targeted.
    pub path_segment: String,
    /// Submitted body.
    pub request: LockRequest,
}

#[derive(Default)]
struct DirectoryState {
    versions: HashMap<String, VersionToken>,
    forced_statuses: HashMap<String, (u16, String)>,
    locks: Vec<RecordedLock>,
}

/// In-memory account directory used for dry runs and tests.
///
/// Enforces the version check the remote directory performs: a lock whose
/// version differs from the stored one is answered with 409.
#[derive(Default)]
pub struct InMemoryAccountDirectory {
    default_version: Option<VersionToken>,
    state: RwLock<DirectoryState>,
}

impl InMemoryAccountDirectory {
    /// Creates an empty directory in which no account has a version.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory where every account exists and every lock is
    /// accepted. Nothing leaves the process.
    #[must_use]
    pub fn dry_run() -> Self {
        Self {
            default_version: VersionToken::from_value(json!("dry-run")),
            state: RwLock::new(DirectoryState::default()),
        }
    }

    /// Stores the current version of an account.
    pub async fn set_version(&self, userid: &str, version: VersionToken) {
        self.state
            .write()
            .await
            .versions
            .insert(userid.to_owned(), version);
    }

    /// Makes every lock of `userid` fail with the given status and body.
    pub async fn force_lock_status(&self, userid: &str, status: u16, body: &str) {
        self.state
            .write()
            .await
            .forced_statuses
            .insert(userid.to_owned(), (status, body.to_owned()));
    }

    /// Returns every accepted lock in submission order.
    pub async fn recorded_locks(&self) -> Vec<RecordedLock> {
        self.state.read().await.locks.clone()
    }

    fn current_version(&self, state: &DirectoryState, userid: &str) -> Option<VersionToken> {
        state
            .versions
            .get(userid)
            .cloned()
            .or_else(|| self.default_version.clone())
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn fetch_version(
        &self,
        _token: &ClientToken,
        account: &AccountRef,
    ) -> AppResult<Option<VersionToken>> {
        let state = self.state.read().await;
        Ok(self.current_version(&state, account.userid.as_str()))
    }

    async fn submit_lock(
        &self,
        _token: &ClientToken,
        account: &AccountRef,
        request: &LockRequest,
    ) -> AppResult<LockReceipt> {
        let mut state = self.state.write().await;
        let userid = account.userid.as_str();

        if let Some((status, body)) = state.forced_statuses.get(userid) {
            return Err(AppError::Upstream {
                status: Some(*status),
                message: body.clone(),
            });
        }

        let Some(current) = self.current_version(&state, userid) else {
            return Err(AppError::Upstream {
                status: Some(404),
                message: format!("user {userid} not found"),
            });
        };
        if current != request.version {
            return Err(AppError::Upstream {
                status: Some(409),
                message: format!(
                    "version mismatch for user {userid}: expected {current}, got {}",
                    request.version
                ),
            });
        }

        info!(
            userid = %userid,
            path_segment = %account.path_segment,
            note = %request.custom_values.blocked_features_note,
            "lock recorded in memory"
        );
        state.locks.push(RecordedLock {
            userid: userid.to_owned(),
            path_segment: account.path_segment.clone(),
            request: request.clone(),
        });

        Ok(LockReceipt {
            status_code: 200,
            body: json!({"userid": userid, "frozen": true}).to_string(),
        })
    }
}
