/// Errors from the registry domain layer.
use thiserror::Error;

use crate::soap::SoapError;

/// Errors that can occur while fetching and exporting registry records.
#[derive(Debug, Error)]
pub enum MastrError {
    /// A required credential environment variable is unset or blank.
    #[error("Environment variable {var} is not set")]
    MissingCredential {
        /// Name of the missing variable.
        var: &'static str,
    },

    /// A flag value passed parsing but is not usable.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The registry call failed.
    #[error("Registry request failed: {0}")]
    Soap(#[from] SoapError),

    /// Reading or writing local files failed.
    #[error("I/O error ({context}): {source}")]
    Io {
        /// What was being done.
        context: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MastrError {
    /// Wrap an I/O error with a short description of the failed step.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Return the CLI exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => 2,
            Self::MissingCredential { .. } => 3,
            Self::Soap(SoapError::Fault { .. }) => 4,
            Self::Soap(_) | Self::Io { .. } | Self::Json(_) => 1,
        }
    }

    /// Machine-readable error code (`snake_case`) for the JSON error envelope.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::MissingCredential { .. } => "missing_credential",
            Self::Soap(SoapError::Fault { .. }) => "soap_fault",
            Self::Soap(SoapError::Http(_) | SoapError::Status { .. }) => "http_error",
            Self::Soap(_) => "soap_error",
            Self::Io { .. } => "io_error",
            Self::Json(_) => "json_error",
        }
    }
}
