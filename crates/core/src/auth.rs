use std::fmt::{Debug, Display, Formatter};

use crate::{AppError, AppResult};

/// Where an access client token was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// Read from the file named by `ACCESS_CLIENT_TOKEN_FILE`.
    SecretFile,
    /// Read from `ACCESS_CLIENT_TOKEN` (a `.env` file included).
    Environment,
    /// Typed by the operator into the upload form.
    Form,
}

impl TokenSource {
    /// Returns a stable label for logs and UI hints.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SecretFile => "secret_file",
            Self::Environment => "environment",
            Self::Form => "form",
        }
    }
}

impl Display for TokenSource {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Credential sent as the `Access-Client-Token` header on every remote call.
///
/// The value never appears in `Debug` output so it cannot leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientToken {
    value: String,
    source: TokenSource,
}

impl ClientToken {
    /// Creates a token, trimming surrounding whitespace.
    pub fn new(value: impl Into<String>, source: TokenSource) -> AppResult<Self> {
        let value = value.into().trim().to_owned();
        if value.is_empty() {
            return Err(AppError::Validation(
                "access client token is required".to_owned(),
            ));
        }

        Ok(Self { value, source })
    }

    /// Returns the raw header value.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.value.as_str()
    }

    /// Returns where the token came from.
    #[must_use]
    pub fn source(&self) -> TokenSource {
        self.source
    }
}

impl Debug for ClientToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientToken")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Resolves the server-side token from the secret file contents and the
/// environment value, in that order. Blank values are skipped.
pub fn configured_client_token(
    secret_file: Option<&str>,
    environment: Option<&str>,
) -> AppResult<Option<ClientToken>> {
    let candidates = [
        (secret_file, TokenSource::SecretFile),
        (environment, TokenSource::Environment),
    ];

    candidates
        .into_iter()
        .find_map(|(value, source)| {
            value
                .filter(|value| !value.trim().is_empty())
                .map(|value| (value, source))
        })
        .map(|(value, source)| ClientToken::new(value, source))
        .transpose()
}

/// Picks the token to use for a batch.
///
/// A server-side token always wins; the form value is only consulted when
/// nothing was configured.
pub fn resolve_client_token(
    configured: Option<&ClientToken>,
    submitted: Option<&str>,
) -> AppResult<ClientToken> {
    if let Some(token) = configured {
        return Ok(token.clone());
    }

    ClientToken::new(submitted.unwrap_or_default(), TokenSource::Form)
}
