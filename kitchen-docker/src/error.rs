use std::{io, path::PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    /// A user-supplied setting could not be used, e.g. a missing Dockerfile.
    #[error("{message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<io::Error>,
    },

    /// Output of a build or run could not be parsed into an identifier.
    #[error("{0}")]
    ActionFailed(String),

    /// The external command exited unsuccessfully or could not be spawned.
    #[error("command `{command}` failed: {reason}")]
    Execution { command: String, reason: String },

    #[error("provisioner error: {0}")]
    Provisioner(#[source] anyhow::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DriverError {
    pub fn dockerfile_not_found(path: PathBuf, source: io::Error) -> DriverError {
        DriverError::Configuration {
            message: format!("could not read dockerfile {:?}", path),
            source: Some(source),
        }
    }

    pub fn action_failed<S: Into<String>>(message: S) -> DriverError {
        DriverError::ActionFailed(message.into())
    }
}
