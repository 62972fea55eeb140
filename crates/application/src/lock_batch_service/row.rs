use std::time::Instant;

use lockdesk_core::ClientToken;
use lockdesk_domain::{LockOutcome, LockRequest, LockRow, LookupDiagnostic};
use tracing::{info, warn};

use super::{LockBatchService, ProcessedRow};

impl LockBatchService {
    /// Looks up the row's version, then submits the lock.
    ///
    /// A missing version short-circuits without a lock call. Every failure is
    /// captured in the returned outcome.
    pub async fn process_row(&self, token: &ClientToken, row: &LockRow) -> ProcessedRow {
        let started_at = Instant::now();
        let account = self.quoting.account_ref(&row.userid);

        let lookup = self.directory.fetch_version(token, &account).await;
        let version = match lookup {
            Ok(Some(version)) => version,
            Ok(None) => {
                warn!(userid = %row.userid, "no version found for user");
                return ProcessedRow {
                    outcome: LockOutcome::version_not_found(&row.userid, started_at.elapsed()),
                    diagnostic: Some(LookupDiagnostic {
                        userid: row.userid.as_str().to_owned(),
                        status: None,
                        detail: format!(
                            "GET users/{}/data-for-edit: response has no user.version",
                            account.path_segment
                        ),
                    }),
                };
            }
            Err(error) => {
                warn!(userid = %row.userid, error = %error, "failed to fetch user version");
                return ProcessedRow {
                    outcome: LockOutcome::version_not_found(&row.userid, started_at.elapsed()),
                    diagnostic: Some(LookupDiagnostic {
                        userid: row.userid.as_str().to_owned(),
                        status: error.upstream_status(),
                        detail: error.to_string(),
                    }),
                };
            }
        };

        let request = LockRequest::freeze(&row.comment, version);
        let outcome = match self.directory.submit_lock(token, &account, &request).await {
            Ok(receipt) => {
                info!(userid = %row.userid, status = receipt.status_code, "account locked");
                LockOutcome::locked(&row.userid, receipt, started_at.elapsed())
            }
            Err(error) => {
                warn!(userid = %row.userid, error = %error, "account lock rejected");
                LockOutcome::rejected(&row.userid, &error, started_at.elapsed())
            }
        };

        ProcessedRow {
            outcome,
            diagnostic: None,
        }
    }
}
