//! Error types for the quark_save crate.

use std::path::PathBuf;

use thiserror::Error;

/// Classified failure of a single outbound HTTP call.
///
/// Raw transport and parse errors never leave the adapter; they are always
/// folded into one of these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request failed: {0}")]
    Unknown(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_connect() {
            HttpError::Connection(err.to_string())
        } else if err.is_decode() {
            HttpError::MalformedResponse(err.to_string())
        } else {
            HttpError::Unknown(err.to_string())
        }
    }
}

/// Errors produced while establishing or requiring a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Cookie must not be empty")]
    EmptyCredential,

    #[error("Cookie is invalid or has expired")]
    InvalidOrExpired,

    #[error("No verified cookie; configure the cookie first")]
    NoSession,

    #[error("Verification request failed: {0}")]
    Transport(#[from] HttpError),
}

/// Errors that can occur while setting the client up.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read credential file {path:?}: {source}")]
    CredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file {0:?} contains no cookie")]
    EmptyCredentialFile(PathBuf),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for Error.
pub type Result<T> = std::result::Result<T, Error>;
