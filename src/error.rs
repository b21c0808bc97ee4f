//! Error types for the upgrade CLI

use thiserror::Error;

/// Main error type for upgrade operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid user input (flag values, file paths)
    #[error("validation error: {0}")]
    Validation(String),

    /// A subprocess exited unsuccessfully
    #[error("command failed: {command} - {message}")]
    Command {
        /// The command line that failed
        command: String,
        /// Captured error output
        message: String,
    },

    /// Unexpected state of a cluster resource
    #[error("resource error: {0}")]
    Resource(String),

    /// Remote registry lookup error
    #[error("registry error: {0}")]
    Registry(String),

    /// Release discovery error
    #[error("release error: {0}")]
    Release(String),

    /// A required environment variable is not set
    #[error("the environment variable {0} must be set")]
    Env(&'static str),

    /// YAML serialization/deserialization error
    #[error("serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a command error from the command line and its error output
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a resource error with the given message
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Create a registry error with the given message
    pub fn registry(msg: impl Into<String>) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a release error with the given message
    pub fn release(msg: impl Into<String>) -> Self {
        Self::Release(msg.into())
    }
}
