use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Structured failure body returned by the DocBase backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub message: String,
    pub code: i64,
    pub errors: BTreeMap<String, String>,
}

impl ApiError {
    /// Reads `message` / `code` / `errors` out of a decoded failure body.
    ///
    /// The backend is not fully trusted here: a missing `message` becomes an
    /// empty string, a missing `code` falls back to the HTTP status, and
    /// `errors` entries that are not strings are stringified.
    pub fn from_body(body: &Value, status: u16) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let code = body
            .get("code")
            .and_then(Value::as_i64)
            .unwrap_or(i64::from(status));
        let mut errors = BTreeMap::new();
        if let Some(map) = body.get("errors").and_then(Value::as_object) {
            for (field, detail) in map {
                let detail = match detail {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                errors.insert(field.clone(), detail);
            }
        }
        Self {
            message,
            code,
            errors,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Classification of a response body that failed strict JSON decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeKind {
    DepthExceeded,
    StateMismatch,
    ControlCharacter,
    Syntax,
    InvalidEncoding,
    EmptyResponse,
}

impl DecodeKind {
    pub fn message(&self) -> &'static str {
        match self {
            DecodeKind::DepthExceeded => "Maximum stack depth exceeded",
            DecodeKind::StateMismatch => "Underflow or the modes mismatch",
            DecodeKind::ControlCharacter => "Unexpected control character found",
            DecodeKind::Syntax => "Syntax error, malformed JSON",
            DecodeKind::InvalidEncoding => {
                "Malformed UTF-8 characters, possibly incorrectly encoded"
            }
            DecodeKind::EmptyResponse => "Empty response received",
        }
    }
}

/// Error taxonomy for the connector.
///
/// Every public operation either returns a success value or fails with one of
/// these; there is no local recovery or retry inside this layer. All variants
/// expose the same structured shape through [`Error::code`] and
/// [`Error::errors`] next to the `Display` message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed or missing input detected locally, before any network call.
    #[error("{0}")]
    InvalidArgument(String),
    /// The connector is not usable as configured (e.g. no API key).
    #[error("{0}")]
    Configuration(String),
    /// A lookup or resolved reference yields no document.
    #[error("{0}")]
    NotFound(String),
    /// The operation is not permitted for the given entity type.
    #[error("{0}")]
    InvalidOperation(String),
    /// The document reference is unusable as given.
    #[error("{0}")]
    InvalidReference(String),
    /// A reference path step names a field the container does not have.
    #[error("{0}")]
    PathNotFound(String),
    /// A reference path step with an object id landed on a non-array value.
    #[error("{0}")]
    InvalidPath(String),
    /// No array element matched the object id of a reference path step.
    #[error("{0}")]
    EmptyResult(String),
    /// The backend answered non-200 with a structured failure body,
    /// preserved verbatim.
    #[error("{0}")]
    Remote(ApiError),
    /// Connection-level failure; normalized to a generic message, code 500.
    #[error("{0}")]
    Transport(String),
    /// The response body is not valid JSON, or not an object/array at the
    /// top level. Carries the raw body for diagnostics.
    #[error("\"{}\" in {}", .kind.message(), .body)]
    Decode {
        kind: DecodeKind,
        body: String,
        status: u16,
    },
}

impl Error {
    pub(crate) fn missing_api_key() -> Self {
        Error::Configuration("use of connector not possible without API key".into())
    }

    pub(crate) fn cannot_connect() -> Self {
        Error::Transport("can not connect".into())
    }

    /// Numeric code for this failure: the backend's code for remote errors,
    /// the HTTP status for decode failures, 500 for transport failures and
    /// 0 for everything detected locally.
    pub fn code(&self) -> i64 {
        match self {
            Error::Remote(api) => api.code,
            Error::Transport(_) => 500,
            Error::Decode { status, .. } => i64::from(*status),
            _ => 0,
        }
    }

    /// Per-field error details from the backend, empty for every other kind.
    pub fn errors(&self) -> BTreeMap<String, String> {
        match self {
            Error::Remote(api) => api.errors.clone(),
            _ => BTreeMap::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
