//! Domain-specific error types for sipoc-bot

use thiserror::Error;

use crate::collector::Stage;

/// Main error type for the charter/SIPOC collector and exporters
#[derive(Error, Debug)]
pub enum SipocError {
    #[error("All questions in the active set have already been answered")]
    AlreadyComplete,

    #[error("Malformed list input for '{key}': no non-empty items after splitting on commas")]
    MalformedListInput { key: String },

    #[error("Session is not finalized (stage: {stage})")]
    NotFinalized { stage: Stage },

    #[error("Diagram render failed: {message}")]
    Render { message: String },

    #[error("Export failed: {message}")]
    ExportIo { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Chat model error: {message}")]
    Model { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl SipocError {
    /// True for errors the front end should answer with a re-prompt instead of aborting
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SipocError::AlreadyComplete | SipocError::MalformedListInput { .. }
        )
    }
}

impl From<std::io::Error> for SipocError {
    fn from(err: std::io::Error) -> Self {
        SipocError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SipocError {
    fn from(err: serde_json::Error) -> Self {
        SipocError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SipocError {
    fn from(err: toml::de::Error) -> Self {
        SipocError::Config {
            message: format!("TOML parse error: {}", err),
        }
    }
}

impl From<csv::Error> for SipocError {
    fn from(err: csv::Error) -> Self {
        SipocError::ExportIo {
            message: format!("CSV write failed: {}", err),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for SipocError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        SipocError::ExportIo {
            message: format!("XLSX write failed: {}", err),
        }
    }
}

impl From<printpdf::Error> for SipocError {
    fn from(err: printpdf::Error) -> Self {
        SipocError::ExportIo {
            message: format!("PDF write failed: {}", err),
        }
    }
}

/// Result type alias for sipoc-bot operations
pub type Result<T> = std::result::Result<T, SipocError>;
