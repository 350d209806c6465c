use thiserror::Error;

use super::EventStatusByte;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ScpiError {
    #[error("command error")]
    CommandError,
    #[error("execution error")]
    ExecutionError,
    #[error("device-dependent error")]
    DevDependError,
    #[error("query error")]
    QueryError,
}

impl ScpiError {
    /// The most severe error flagged in an event status register, if any.
    pub fn from_event_byte(byte: &EventStatusByte) -> Option<Self> {
        if byte.is_command_err() {
            Some(ScpiError::CommandError)
        } else if byte.is_execution_err() {
            Some(ScpiError::ExecutionError)
        } else if byte.is_device_dep_err() {
            Some(ScpiError::DevDependError)
        } else if byte.is_query_err() {
            Some(ScpiError::QueryError)
        } else {
            None
        }
    }
}
