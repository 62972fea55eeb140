use axum::extract::multipart::MultipartError;
use lockdesk_domain::CandidateRow;

use super::*;

const TOKEN_FIELD: &str = "access_client_token";
const WORKERS_FIELD: &str = "workers";
const FILE_FIELD: &str = "file";

/// Fields of one multipart lock batch upload. Unknown fields are ignored.
#[derive(Debug, Default)]
pub(super) struct LockBatchSubmission {
    token: Option<String>,
    workers: Option<String>,
    file: Option<Vec<u8>>,
}

impl LockBatchSubmission {
    pub(super) async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut submission = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                TOKEN_FIELD => {
                    submission.token = Some(field.text().await.map_err(invalid_multipart)?);
                }
                WORKERS_FIELD => {
                    submission.workers = Some(field.text().await.map_err(invalid_multipart)?);
                }
                FILE_FIELD => {
                    submission.file = Some(field.bytes().await.map_err(invalid_multipart)?.to_vec());
                }
                _ => {}
            }
        }

        Ok(submission)
    }

    pub(super) fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(super) fn workers(&self) -> Option<&str> {
        self.workers.as_deref()
    }

    pub(super) fn candidate_rows(&self) -> AppResult<Vec<CandidateRow>> {
        match self.file.as_deref() {
            Some(contents) if !contents.is_empty() => read_lock_rows(contents),
            _ => Err(AppError::Validation("csv file is required".to_owned())),
        }
    }
}

fn invalid_multipart(error: MultipartError) -> AppError {
    AppError::Validation(format!("invalid multipart upload: {}", error.body_text()))
}
