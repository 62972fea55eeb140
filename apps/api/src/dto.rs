use lockdesk_domain::{LockBatchReport, LockOutcome, LookupDiagnostic, RowRejection};
use serde::Serialize;

/// Health response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// API representation of a processed lock batch.
#[derive(Debug, Serialize)]
pub struct LockBatchResponse {
    pub batch_id: String,
    pub elapsed_seconds: f64,
    pub succeeded: usize,
    pub failed: usize,
    /// Outcomes in completion order.
    pub outcomes: Vec<LockOutcomeResponse>,
    pub rejections: Vec<RowRejectionResponse>,
    pub diagnostics: Vec<LookupDiagnosticResponse>,
}

/// API representation of one row outcome.
#[derive(Debug, Serialize)]
pub struct LockOutcomeResponse {
    pub userid: String,
    pub success: bool,
    pub status_code: Option<u16>,
    pub msg: String,
    pub duration_seconds: f64,
}

/// API representation of an input row that was set aside.
#[derive(Debug, Serialize)]
pub struct RowRejectionResponse {
    pub line: usize,
    pub raw: String,
    pub reason: String,
}

/// API representation of a failed version lookup.
#[derive(Debug, Serialize)]
pub struct LookupDiagnosticResponse {
    pub userid: String,
    pub status: Option<u16>,
    pub detail: String,
}

impl From<LockBatchReport> for LockBatchResponse {
    fn from(report: LockBatchReport) -> Self {
        Self {
            batch_id: report.batch_id.to_string(),
            elapsed_seconds: report.elapsed_seconds(),
            succeeded: report.succeeded_count(),
            failed: report.failed_count(),
            outcomes: report.outcomes.into_iter().map(Into::into).collect(),
            rejections: report.rejections.into_iter().map(Into::into).collect(),
            diagnostics: report.diagnostics.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<LockOutcome> for LockOutcomeResponse {
    fn from(outcome: LockOutcome) -> Self {
        let duration_seconds = outcome.duration_seconds();
        Self {
            userid: outcome.userid,
            success: outcome.success,
            status_code: outcome.status_code,
            msg: outcome.message,
            duration_seconds,
        }
    }
}

impl From<RowRejection> for RowRejectionResponse {
    fn from(rejection: RowRejection) -> Self {
        Self {
            line: rejection.line,
            raw: rejection.raw,
            reason: rejection.reason,
        }
    }
}

impl From<LookupDiagnostic> for LookupDiagnosticResponse {
    fn from(diagnostic: LookupDiagnostic) -> Self {
        Self {
            userid: diagnostic.userid,
            status: diagnostic.status,
            detail: diagnostic.detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lockdesk_domain::{LockBatchReport, LockOutcome, LookupDiagnostic, RowRejection};
    use serde_json::json;
    use uuid::Uuid;

    use super::LockBatchResponse;

    #[test]
    fn batch_response_serializes_report_fields() {
        let report = LockBatchReport {
            batch_id: Uuid::nil(),
            outcomes: vec![LockOutcome {
                userid: "123".to_owned(),
                success: false,
                status_code: Some(409),
                message: "conflict".to_owned(),
                duration: Duration::from_millis(1500),
            }],
            rejections: vec![RowRejection {
                line: 2,
                raw: ",x".to_owned(),
                reason: "Invalid row format".to_owned(),
            }],
            diagnostics: vec![LookupDiagnostic {
                userid: "9".to_owned(),
                status: None,
                detail: "GET http://directory/users/'9/data-for-edit: timed out".to_owned(),
            }],
            elapsed: Duration::from_millis(2000),
        };

        let payload = serde_json::to_value(LockBatchResponse::from(report))
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(
            payload,
            json!({
                "batch_id": "00000000-0000-0000-0000-000000000000",
                "elapsed_seconds": 2.0,
                "succeeded": 0,
                "failed": 1,
                "outcomes": [{
                    "userid": "123",
                    "success": false,
                    "status_code": 409,
                    "msg": "conflict",
                    "duration_seconds": 1.5
                }],
                "rejections": [{"line": 2, "raw": ",x", "reason": "Invalid row format"}],
                "diagnostics": [{
                    "userid": "9",
                    "status": null,
                    "detail": "GET http://directory/users/'9/data-for-edit: timed out"
                }]
            })
        );
    }
}
