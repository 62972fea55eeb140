use std::fmt::{Display, Formatter};
use std::str::FromStr;

use lockdesk_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// User identifier exactly as the operator supplied it, trimmed.
///
/// Identifiers stay textual so long numeric ids are never re-rendered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserIdentifier(NonEmptyString);

impl UserIdentifier {
    /// Creates an identifier from raw input.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        NonEmptyString::new(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation("userid must not be empty".to_owned()))
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn char_len(&self) -> usize {
        self.as_str().chars().count()
    }
}

impl Display for UserIdentifier {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Rule used to render an identifier into the remote API's path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierQuoting {
    /// Identifiers shorter than `threshold` characters get a leading `'`;
    /// longer ones are sent bare.
    ApostropheBelow {
        /// Length at which identifiers stop being prefixed.
        threshold: usize,
    },
    /// Short identifiers get a leading `'`, long ones are wrapped in `"`.
    ApostropheOrDoubleQuote {
        /// Length at which identifiers switch to double quotes.
        threshold: usize,
    },
    /// Identifiers are sent unchanged.
    Plain,
}

impl IdentifierQuoting {
    /// Length threshold used when none is configured.
    pub const DEFAULT_THRESHOLD: usize = 16;

    /// Builds a rule from its configuration name and threshold.
    pub fn from_setting(name: &str, threshold: usize) -> AppResult<Self> {
        let rule = Self::from_str(name)?;
        Ok(match rule {
            Self::ApostropheBelow { .. } => Self::ApostropheBelow { threshold },
            Self::ApostropheOrDoubleQuote { .. } => Self::ApostropheOrDoubleQuote { threshold },
            Self::Plain => Self::Plain,
        })
    }

    /// Returns the configuration name of this rule.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApostropheBelow { .. } => "apostrophe",
            Self::ApostropheOrDoubleQuote { .. } => "apostrophe-double",
            Self::Plain => "plain",
        }
    }

    /// Renders the identifier for the remote API.
    #[must_use]
    pub fn format(&self, userid: &UserIdentifier) -> String {
        let raw = userid.as_str();
        match *self {
            Self::ApostropheBelow { threshold } if userid.char_len() < threshold => {
                format!("'{raw}")
            }
            Self::ApostropheBelow { .. } | Self::Plain => raw.to_owned(),
            Self::ApostropheOrDoubleQuote { threshold } if userid.char_len() < threshold => {
                format!("'{raw}")
            }
            Self::ApostropheOrDoubleQuote { .. } => format!("\"{raw}\""),
        }
    }

    /// Pairs the identifier with its rendered path segment.
    #[must_use]
    pub fn account_ref(&self, userid: &UserIdentifier) -> AccountRef {
        AccountRef {
            userid: userid.clone(),
            path_segment: self.format(userid),
        }
    }
}

impl Default for IdentifierQuoting {
    fn default() -> Self {
        Self::ApostropheBelow {
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl FromStr for IdentifierQuoting {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let threshold = Self::DEFAULT_THRESHOLD;
        match value.trim().to_ascii_lowercase().as_str() {
            "apostrophe" => Ok(Self::ApostropheBelow { threshold }),
            "apostrophe-double" => Ok(Self::ApostropheOrDoubleQuote { threshold }),
            "plain" => Ok(Self::Plain),
            other => Err(AppError::Validation(format!(
                "unknown identifier quoting rule '{other}', expected 'apostrophe', 'apostrophe-double' or 'plain'"
            ))),
        }
    }
}

/// Remote account addressed by one user identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    /// Identifier as supplied by the operator.
    pub userid: UserIdentifier,
    /// Identifier rendered by the configured quoting rule.
    pub path_segment: String,
}
