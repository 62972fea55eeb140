use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lockdesk_core::AppError;
use lockdesk_domain::{LockBatchReport, WorkerCount};
use lockdesk_infrastructure::REPORT_FILE_NAME;

use crate::dto::RowRejectionResponse;
use crate::error::ApiError;

#[derive(Template)]
#[template(path = "form.html")]
pub struct FormTemplate {
    pub token_required: bool,
    pub quoting: &'static str,
    pub min_workers: usize,
    pub max_workers: usize,
    pub default_workers: usize,
    pub has_error: bool,
    pub error_message: String,
}

impl FormTemplate {
    pub fn new(token_required: bool, quoting: &'static str, default_workers: WorkerCount) -> Self {
        Self {
            token_required,
            quoting,
            min_workers: WorkerCount::MIN,
            max_workers: WorkerCount::MAX,
            default_workers: default_workers.get(),
            has_error: false,
            error_message: String::new(),
        }
    }

    #[must_use]
    pub fn with_error(mut self, message: String) -> Self {
        self.has_error = true;
        self.error_message = message;
        self
    }
}

pub struct OutcomeRow {
    pub userid: String,
    pub success: bool,
    pub status_code: String,
    pub msg: String,
    pub duration_seconds: String,
}

pub struct DiagnosticRow {
    pub userid: String,
    pub status: String,
    pub detail: String,
}

#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    pub batch_id: String,
    pub processed: usize,
    pub elapsed_seconds: String,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<OutcomeRow>,
    pub rejections: Vec<RowRejectionResponse>,
    pub diagnostics: Vec<DiagnosticRow>,
    pub download_href: String,
    pub file_name: &'static str,
}

impl ReportTemplate {
    /// Builds the page for `report`, embedding `csv` as a download link.
    pub fn new(report: LockBatchReport, csv: &[u8]) -> Self {
        let elapsed_seconds = format!("{:.2}", report.elapsed_seconds());
        let succeeded = report.succeeded_count();
        let failed = report.failed_count();

        Self {
            batch_id: report.batch_id.to_string(),
            processed: report.outcomes.len(),
            elapsed_seconds,
            succeeded,
            failed,
            outcomes: report
                .outcomes
                .into_iter()
                .map(|outcome| OutcomeRow {
                    duration_seconds: format!("{:.3}", outcome.duration_seconds()),
                    status_code: outcome
                        .status_code
                        .map(|status| status.to_string())
                        .unwrap_or_default(),
                    userid: outcome.userid,
                    success: outcome.success,
                    msg: outcome.message,
                })
                .collect(),
            rejections: report.rejections.into_iter().map(Into::into).collect(),
            diagnostics: report
                .diagnostics
                .into_iter()
                .map(|diagnostic| DiagnosticRow {
                    status: diagnostic
                        .status
                        .map(|status| status.to_string())
                        .unwrap_or_else(|| "none".to_owned()),
                    userid: diagnostic.userid,
                    detail: diagnostic.detail,
                })
                .collect(),
            download_href: format!("data:text/csv;base64,{}", STANDARD.encode(csv)),
            file_name: REPORT_FILE_NAME,
        }
    }
}

/// Renders a template into an HTML response with the given status.
pub fn render_page<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(error) => {
            ApiError(AppError::Internal(format!("failed to render page: {error}"))).into_response()
        }
    }
}
