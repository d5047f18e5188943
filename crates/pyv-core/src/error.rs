use thiserror::Error;

use crate::config::ConfigError;
use crate::version::{PythonVersion, VersionParseError};

/// Errors surfaced by the version lifecycle engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    MalformedVersion(#[from] VersionParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("version {version} is already installed")]
    AlreadyInstalled { version: PythonVersion },

    #[error("version {version} is not installed")]
    NotInstalled { version: PythonVersion },

    #[error("network error during {operation}: {details}")]
    Network {
        operation: &'static str,
        details: String,
    },

    #[error("build step `{step}` failed:\n{output}")]
    Build { step: &'static str, output: String },

    #[error("installed interpreter reports `{reported}`, expected {expected}")]
    Verification {
        expected: PythonVersion,
        reported: String,
    },

    #[error("no stable version available from the mirror")]
    NoStableVersion,

    #[error("operation not supported on this platform: {operation}")]
    Unsupported { operation: &'static str },

    #[error("another process is already operating on this prefix")]
    PrefixLocked,

    #[error("no python interpreter found")]
    NoInterpreter,

    #[error("interpreter exited with failure:\n{output}")]
    CommandFailed { output: String },

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub fn network(operation: &'static str, details: impl Into<String>) -> Self {
        Self::Network {
            operation,
            details: details.into(),
        }
    }

    pub fn network_from<E>(operation: &'static str, error: E) -> Self
    where
        E: std::fmt::Display,
    {
        Self::network(operation, error.to_string())
    }

    pub fn build(step: &'static str, output: impl Into<String>) -> Self {
        Self::Build {
            step,
            output: output.into(),
        }
    }

    pub fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }
}
