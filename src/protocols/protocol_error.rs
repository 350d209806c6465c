use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("serial protocol error: {0}")]
    SerialError(#[from] serial::Error),
    #[error("tcp protocol error: {0}")]
    TcpError(#[from] std::io::Error),
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
}

impl ProtocolError {
    pub fn is_timeout(&self) -> bool {
        match self {
            ProtocolError::TcpError(e) => crate::error::is_timeout_kind(e.kind()),
            ProtocolError::SerialError(e) => match e.kind() {
                serial::ErrorKind::Io(kind) => crate::error::is_timeout_kind(kind),
                _ => false,
            },
            ProtocolError::InvalidAddress(_) => false,
        }
    }
}
