//! Error types for convert-core

use thiserror::Error;

/// Why a dispatched job ended without a delivered artifact
#[derive(Debug, Error)]
pub enum JobError {
    #[error("download failed: {0}")]
    Download(String),

    #[error("converter failed: {0}")]
    Converter(String),

    #[error("workspace error: {0}")]
    Io(#[from] std::io::Error),

    #[error("job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Text shown to the user; internal detail stays in the logs
    pub fn user_message(&self) -> String {
        match self {
            Self::Download(_) => {
                "Could not download your file from Telegram, please send it again.".to_string()
            }
            Self::Converter(reason) => format!("Operation failed: {}", reason),
            Self::Io(_) | Self::Panicked(_) => "An error occurred during conversion.".to_string(),
        }
    }
}

/// Failures surfaced by the router to the transport loop
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// Failures a converter registry reports back to the job runner
#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("operation '{operation}' is not available")]
    Unavailable { operation: String },

    #[error("{0}")]
    Failed(String),

    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("delivery failed: {0}")]
    Delivery(String),
}
