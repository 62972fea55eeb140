use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use lockdesk_core::ClientToken;
use lockdesk_domain::{CandidateRow, LockBatchReport, LockOutcome, LockRow, WorkerCount};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::LockBatchService;

impl LockBatchService {
    /// Processes every valid row with at most `workers` rows in flight.
    ///
    /// Rows without an identifier are set aside as rejections. Outcomes are
    /// collected in completion order and a faulted row task still yields a
    /// failed outcome, so the report holds exactly one outcome per valid row.
    /// The token is shared read-only by every row of the batch.
    pub async fn run_batch(
        &self,
        token: &ClientToken,
        rows: Vec<CandidateRow>,
        workers: WorkerCount,
    ) -> LockBatchReport {
        let batch_id = Uuid::new_v4();
        let started_at = Instant::now();

        let mut rejections = Vec::new();
        let mut valid_rows = Vec::with_capacity(rows.len());
        for candidate in rows {
            match LockRow::try_from(candidate) {
                Ok(row) => valid_rows.push(row),
                Err(rejection) => {
                    warn!(
                        batch_id = %batch_id,
                        line = rejection.line,
                        reason = %rejection.reason,
                        "skipping input row"
                    );
                    rejections.push(rejection);
                }
            }
        }

        info!(
            batch_id = %batch_id,
            row_count = valid_rows.len(),
            rejected_count = rejections.len(),
            workers = workers.get(),
            token_source = %token.source(),
            quoting = self.quoting.as_str(),
            "lock batch started"
        );

        let permits = Arc::new(Semaphore::new(workers.get()));
        let mut tasks = JoinSet::new();
        let mut userids_by_task = HashMap::with_capacity(valid_rows.len());
        for row in valid_rows {
            let service = self.clone();
            let token = token.clone();
            let permits = Arc::clone(&permits);
            let userid = row.userid.as_str().to_owned();
            let handle = tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                service.process_row(&token, &row).await
            });
            userids_by_task.insert(handle.id(), userid);
        }

        let mut outcomes = Vec::with_capacity(userids_by_task.len());
        let mut diagnostics = Vec::new();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, processed)) => {
                    outcomes.push(processed.outcome);
                    diagnostics.extend(processed.diagnostic);
                }
                Err(join_error) => {
                    let userid = userids_by_task
                        .get(&join_error.id())
                        .cloned()
                        .unwrap_or_default();
                    let message = fault_message(join_error);
                    error!(
                        batch_id = %batch_id,
                        userid = %userid,
                        error = %message,
                        "row task faulted"
                    );
                    outcomes.push(LockOutcome::faulted(&userid, message));
                }
            }
        }

        let report = LockBatchReport {
            batch_id,
            outcomes,
            rejections,
            diagnostics,
            elapsed: started_at.elapsed(),
        };

        info!(
            batch_id = %batch_id,
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            rejected = report.rejections.len(),
            elapsed_seconds = report.elapsed_seconds(),
            "lock batch finished"
        );

        report
    }
}

fn fault_message(join_error: JoinError) -> String {
    if !join_error.is_panic() {
        return format!("row task did not complete: {join_error}");
    }

    let payload = join_error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        return format!("row task panicked: {message}");
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return format!("row task panicked: {message}");
    }

    "row task panicked".to_owned()
}
