use std::time::Duration;

use lockdesk_core::{AppError, AppResult};
use serde::Serialize;
use uuid::Uuid;

use crate::{LockReceipt, UserIdentifier};

/// Message recorded when the lookup yields no version.
pub const VERSION_NOT_FOUND_MESSAGE: &str = "versionInfo not found";

/// Reason recorded for input rows without a usable identifier.
pub const INVALID_ROW_MESSAGE: &str = "Invalid row format";

/// Unvalidated input record as read from the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    /// 1-based data line (header excluded).
    pub line: usize,
    /// `userid` cell, absent when the column or cell is missing.
    pub userid: Option<String>,
    /// `comment` cell, absent when the column or cell is missing.
    pub comment: Option<String>,
    /// The whole record, comma-joined, for error reporting.
    pub raw: String,
}

/// Validated row ready for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRow {
    /// Account to lock.
    pub userid: UserIdentifier,
    /// Operator comment, empty when not supplied.
    pub comment: String,
}

impl LockRow {
    /// Creates a row from an identifier and optional comment.
    pub fn new(userid: impl Into<String>, comment: Option<String>) -> AppResult<Self> {
        Ok(Self {
            userid: UserIdentifier::new(userid)?,
            comment: comment.unwrap_or_default(),
        })
    }
}

impl TryFrom<CandidateRow> for LockRow {
    type Error = RowRejection;

    fn try_from(candidate: CandidateRow) -> Result<Self, Self::Error> {
        let CandidateRow {
            line,
            userid,
            comment,
            raw,
        } = candidate;

        match userid.map(|userid| Self::new(userid, comment)) {
            Some(Ok(row)) => Ok(row),
            Some(Err(_)) | None => Err(RowRejection {
                line,
                raw,
                reason: INVALID_ROW_MESSAGE.to_owned(),
            }),
        }
    }
}

/// Input row that was not submitted for processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// 1-based data line (header excluded).
    pub line: usize,
    /// The rejected record.
    pub raw: String,
    /// Why the row was set aside.
    pub reason: String,
}

/// Details of a version lookup that produced no version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupDiagnostic {
    /// Identifier being looked up.
    pub userid: String,
    /// Remote status when a response arrived.
    pub status: Option<u16>,
    /// Response body or transport error, or a note that the field is missing.
    pub detail: String,
}

/// Outcome of locking one row.
#[derive(Debug, Clone, PartialEq)]
pub struct LockOutcome {
    /// Identifier of the processed row.
    pub userid: String,
    /// Whether the lock call returned 2xx.
    pub success: bool,
    /// Remote status of the lock call, absent when none was received.
    pub status_code: Option<u16>,
    /// Response body on success, failure reason otherwise.
    pub message: String,
    /// Wall time spent on the row's remote calls.
    pub duration: Duration,
}

impl LockOutcome {
    /// Outcome for a lock call that returned 2xx.
    #[must_use]
    pub fn locked(userid: &UserIdentifier, receipt: LockReceipt, duration: Duration) -> Self {
        Self {
            userid: userid.as_str().to_owned(),
            success: true,
            status_code: Some(receipt.status_code),
            message: receipt.body,
            duration,
        }
    }

    /// Outcome for a row whose lookup produced no version.
    #[must_use]
    pub fn version_not_found(userid: &UserIdentifier, duration: Duration) -> Self {
        Self {
            userid: userid.as_str().to_owned(),
            success: false,
            status_code: None,
            message: VERSION_NOT_FOUND_MESSAGE.to_owned(),
            duration,
        }
    }

    /// Outcome for a rejected or failed lock call.
    #[must_use]
    pub fn rejected(userid: &UserIdentifier, error: &AppError, duration: Duration) -> Self {
        Self {
            userid: userid.as_str().to_owned(),
            success: false,
            status_code: error.upstream_status(),
            message: error.to_string(),
            duration,
        }
    }

    /// Outcome for a row whose task faulted before producing a result.
    #[must_use]
    pub fn faulted(userid: &str, message: impl Into<String>) -> Self {
        Self {
            userid: userid.to_owned(),
            success: false,
            status_code: None,
            message: message.into(),
            duration: Duration::ZERO,
        }
    }

    /// Row duration in seconds, rounded to milliseconds.
    #[must_use]
    pub fn duration_seconds(&self) -> f64 {
        round_to(self.duration.as_secs_f64(), 1000.0)
    }
}

/// Number of rows processed concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerCount(usize);

impl WorkerCount {
    /// Smallest accepted worker count.
    pub const MIN: usize = 1;
    /// Largest accepted worker count.
    pub const MAX: usize = 20;
    /// Worker count used when none is chosen.
    pub const DEFAULT: usize = 5;

    /// Creates a worker count within `MIN..=MAX`.
    pub fn new(value: usize) -> AppResult<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(AppError::Validation(format!(
                "worker count must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }

        Ok(Self(value))
    }

    /// Returns the count.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

/// Everything one batch run produced.
#[derive(Debug, Clone)]
pub struct LockBatchReport {
    /// Identifier used to correlate log lines of one run.
    pub batch_id: Uuid,
    /// One outcome per valid row, in completion order.
    pub outcomes: Vec<LockOutcome>,
    /// Rows that were not submitted.
    pub rejections: Vec<RowRejection>,
    /// Lookups that returned no version.
    pub diagnostics: Vec<LookupDiagnostic>,
    /// Wall time of the whole batch.
    pub elapsed: Duration,
}

impl LockBatchReport {
    /// Number of rows locked successfully.
    #[must_use]
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.success).count()
    }

    /// Number of processed rows that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    /// Batch wall time in seconds, rounded to hundredths.
    #[must_use]
    pub fn elapsed_seconds(&self) -> f64 {
        round_to(self.elapsed.as_secs_f64(), 100.0)
    }
}

fn round_to(value: f64, scale: f64) -> f64 {
    (value * scale).round() / scale
}
