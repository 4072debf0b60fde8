//! Client-side error taxonomy.
//!
//! Every failure a caller can observe is one of these variants. [`ErrorKind`]
//! groups them by who is expected to handle them: connectivity and
//! authorization problems are handled globally by the gateway and the guard,
//! validation and business-rule problems by the view that started the call.

use http::StatusCode;
use thiserror::Error;

use crate::rules::RuleViolation;
use crate::session::TransitionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No response was received (refused connection, timeout, broken transport).
    #[error("could not reach the server: {0}")]
    Connectivity(String),

    /// The server rejected the credentials, or the held token has expired.
    #[error("not authorized: {0}")]
    Unauthorized(String),

    /// The server rejected the input itself (400/422).
    #[error("invalid request: {message}")]
    Validation { status: u16, message: String },

    /// A team/recruit rule was violated, either detected locally or reported by the server.
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    /// Any other non-success status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// A 2xx response whose envelope carried `success = false`.
    #[error("request was not successful: {0}")]
    Rejected(String),

    /// The response body could not be understood.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The same action is already waiting for the server.
    #[error("'{0}' is already in progress")]
    InFlight(String),

    #[error(transparent)]
    Session(#[from] TransitionError),
}

/// Coarse classification used to decide where an error gets handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connectivity,
    Authorization,
    Validation,
    BusinessRule,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Connectivity(_) => ErrorKind::Connectivity,
            Error::Unauthorized(_) => ErrorKind::Authorization,
            Error::Validation { .. } => ErrorKind::Validation,
            Error::Rule(_) => ErrorKind::BusinessRule,
            _ => ErrorKind::Other,
        }
    }

    /// Whether the user can simply try again without logging in anew.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Authorization)
    }

    /// Maps a non-success HTTP status and the server's message onto the taxonomy.
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Error::Unauthorized(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => Error::Validation {
                status: status.as_u16(),
                message,
            },
            StatusCode::CONFLICT => Error::Rule(RuleViolation::RejectedByServer(message)),
            _ => Error::Server {
                status: status.as_u16(),
                message,
            },
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Error::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            Error::from_status(status, err.to_string())
        } else {
            // connect, timeout, request and body errors all mean no usable response arrived
            Error::Connectivity(err.to_string())
        }
    }
}
