use thiserror::Error;

use crate::{protocols::protocol_error::ProtocolError, scpi, validators::ValidationError};

#[derive(Error, Debug)]
pub enum Error {
    #[error("transfer layer error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("protocol error: {0}")]
    ProtocolError(#[from] ProtocolError),
    #[error("scpi error: {0}")]
    ScpiError(#[from] scpi::scpi_error::ScpiError),
    #[error("invalid value: {0}")]
    ValidationError(#[from] ValidationError),
    #[error("unexpected reply to '{command}': '{response}'")]
    InvalidResponse { command: String, response: String },
    #[error("malformed binary block: {0}")]
    InvalidBlock(String),
    #[error("not supported: {0}")]
    Unsupported(String),
    #[error("config error: {0}")]
    ConfigError(#[from] toml::de::Error),
    #[error("{0}")]
    Other(#[from] OtherError),
}

impl Error {
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::IOError(e) => is_timeout_kind(e.kind()),
            Error::ProtocolError(e) => e.is_timeout(),
            _ => false,
        }
    }

    pub(crate) fn invalid_response<C: AsRef<str>, R: AsRef<str>>(command: C, response: R) -> Self {
        Error::InvalidResponse {
            command: command.as_ref().to_string(),
            response: response.as_ref().to_string(),
        }
    }
}

impl From<serial::Error> for Error {
    fn from(e: serial::Error) -> Self {
        Error::ProtocolError(e.into())
    }
}

#[derive(Debug)]
pub struct OtherError(String);

impl std::fmt::Display for OtherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.0)
    }
}

impl std::error::Error for OtherError {}
impl<'a> From<&'a str> for OtherError {
    fn from(s: &'a str) -> Self {
        Self(s.to_string())
    }
}
impl From<String> for OtherError {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'a> From<&'a str> for Error {
    fn from(s: &'a str) -> Self {
        Error::Other(OtherError::from(s))
    }
}
impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(OtherError::from(s))
    }
}

/// Sockets with a read timeout report `WouldBlock` on Unix and `TimedOut` on
/// Windows.
pub(crate) fn is_timeout_kind(kind: std::io::ErrorKind) -> bool {
    matches!(kind, std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock)
}

pub type Result<T> = std::result::Result<T, Error>;
