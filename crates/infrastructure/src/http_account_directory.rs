use std::time::Duration;

use async_trait::async_trait;
use lockdesk_application::AccountDirectory;
use lockdesk_core::{AppError, AppResult, ClientToken};
use lockdesk_domain::{AccountRef, LockReceipt, LockRequest, VersionToken};
use reqwest::header;
use serde_json::Value;
use tracing::debug;
use url::Url;

const ACCESS_CLIENT_TOKEN_HEADER: &str = "Access-Client-Token";
const DATA_FOR_EDIT_SEGMENT: &str = "data-for-edit";

/// Per-call timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Remote user directory reached over HTTP.
#[derive(Clone)]
pub struct HttpAccountDirectory {
    http_client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
}

impl HttpAccountDirectory {
    /// Creates a directory client rooted at `base_url` (for example
    /// `https://wallet.example/api`).
    pub fn new(http_client: reqwest::Client, base_url: &str) -> AppResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|error| {
            AppError::Validation(format!("invalid directory base url '{base_url}': {error}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Validation(format!(
                "directory base url '{base_url}' cannot carry a path"
            )));
        }

        Ok(Self {
            http_client,
            base_url,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Overrides the per-call timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    fn account_url(&self, account: &AccountRef, suffix: Option<&str>) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                AppError::Internal("directory base url cannot carry a path".to_owned())
            })?;
            segments
                .pop_if_empty()
                .push("users")
                .push(account.path_segment.as_str());
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }

        Ok(url)
    }

    fn authorized(
        &self,
        builder: reqwest::RequestBuilder,
        token: &ClientToken,
    ) -> reqwest::RequestBuilder {
        builder
            .header(ACCESS_CLIENT_TOKEN_HEADER, token.expose())
            .header(header::CONTENT_TYPE, "application/json")
            .timeout(self.request_timeout)
    }
}

#[async_trait]
impl AccountDirectory for HttpAccountDirectory {
    async fn fetch_version(
        &self,
        token: &ClientToken,
        account: &AccountRef,
    ) -> AppResult<Option<VersionToken>> {
        let url = self.account_url(account, Some(DATA_FOR_EDIT_SEGMENT))?;
        debug!(url = %url, "fetching user version");
        let response = self
            .authorized(self.http_client.get(url.clone()), token)
            .send()
            .await
            .map_err(|error| transport_error("GET", &url, &error))?;

        let (status, body) = read_body("GET", &url, response).await?;

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: Some(status.as_u16()),
                message: format!("GET {url}: {}", describe_body(&body, status)),
            });
        }

        let payload = serde_json::from_str::<Value>(&body).map_err(|error| AppError::Upstream {
            status: Some(status.as_u16()),
            message: format!("GET {url}: response is not valid JSON: {error}"),
        })?;

        Ok(VersionToken::from_edit_payload(&payload))
    }

    async fn submit_lock(
        &self,
        token: &ClientToken,
        account: &AccountRef,
        request: &LockRequest,
    ) -> AppResult<LockReceipt> {
        let url = self.account_url(account, None)?;
        debug!(url = %url, "submitting account lock");
        let response = self
            .authorized(self.http_client.put(url.clone()), token)
            .json(request)
            .send()
            .await
            .map_err(|error| transport_error("PUT", &url, &error))?;

        let (status, body) = read_body("PUT", &url, response).await?;

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: Some(status.as_u16()),
                message: format!("PUT {url}: {}", describe_body(&body, status)),
            });
        }

        Ok(LockReceipt {
            status_code: status.as_u16(),
            body,
        })
    }
}

fn transport_error(method: &str, url: &Url, error: &reqwest::Error) -> AppError {
    let message = if error.is_timeout() {
        format!("{method} {url}: request timed out: {error}")
    } else {
        format!("{method} {url}: {error}")
    };

    AppError::Upstream {
        status: None,
        message,
    }
}

async fn read_body(
    method: &str,
    url: &Url,
    response: reqwest::Response,
) -> AppResult<(reqwest::StatusCode, String)> {
    let status = response.status();
    let body = response.text().await.map_err(|error| AppError::Upstream {
        status: Some(status.as_u16()),
        message: format!("{method} {url}: failed to read response body: {error}"),
    })?;

    Ok((status, body))
}

fn describe_body(body: &str, status: reqwest::StatusCode) -> String {
    if body.trim().is_empty() {
        return status.to_string();
    }

    body.to_owned()
}
