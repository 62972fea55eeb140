use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use lockdesk_core::{AppError, AppResult, resolve_client_token};
use lockdesk_domain::{LockBatchReport, WorkerCount};
use lockdesk_infrastructure::{REPORT_FILE_NAME, read_lock_rows, write_lock_report};
use tracing::warn;

use crate::dto::LockBatchResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::views::{FormTemplate, ReportTemplate, render_page};

mod submission;


use submission::LockBatchSubmission;

pub async fn lock_batch_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<LockBatchResponse>> {
    let report = run_submission(&state, multipart).await?;

    Ok(Json(LockBatchResponse::from(report)))
}

pub async fn lock_batch_report_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let report = run_submission(&state, multipart).await?;
    let csv = write_lock_report(&report.outcomes)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{REPORT_FILE_NAME}\""),
            ),
        ],
        csv,
    )
        .into_response())
}

/// Form submission target. Failures re-render the form with the error.
pub async fn lock_batch_page_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    match build_report_page(&state, multipart).await {
        Ok(page) => render_page(StatusCode::OK, &page),
        Err(error) => {
            warn!(error = %error, "lock batch submission rejected");
            let message = error.to_string();
            let status = ApiError::from(error).status_code();
            let form = FormTemplate::new(
                state.configured_token.is_none(),
                state.lock_batch_service.quoting().as_str(),
                state.default_workers,
            )
            .with_error(message);

            render_page(status, &form)
        }
    }
}

async fn build_report_page(state: &AppState, multipart: Multipart) -> AppResult<ReportTemplate> {
    let report = run_submission(state, multipart).await?;
    let csv = write_lock_report(&report.outcomes)?;

    Ok(ReportTemplate::new(report, &csv))
}

async fn run_submission(state: &AppState, multipart: Multipart) -> AppResult<LockBatchReport> {
    let submission = LockBatchSubmission::read(multipart).await?;

    let token = resolve_client_token(state.configured_token.as_ref(), submission.token())?;
    let rows = submission.candidate_rows()?;
    let workers = parse_worker_count(submission.workers(), state.default_workers)?;

    Ok(state
        .lock_batch_service
        .run_batch(&token, rows, workers)
        .await)
}

fn parse_worker_count(raw: Option<&str>, default: WorkerCount) -> AppResult<WorkerCount> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(default);
    };

    let value = raw.parse::<usize>().map_err(|_| {
        AppError::Validation(format!(
            "workers must be a whole number between {} and {}, got '{raw}'",
            WorkerCount::MIN,
            WorkerCount::MAX
        ))
    })?;

    WorkerCount::new(value)
}
