//! Unified error type for the conversion engine.
//!
//! Every failure of a conversion is fatal for that request and carries the
//! offending name, path, or type (plus valid alternatives where they exist),
//! because the remote engine's own diagnostics say very little.

use std::fmt;
use std::path::PathBuf;

use officeconv_core::error::AppError;
use thiserror::Error;

use crate::bridge::BridgeError;

/// Which filter catalog a name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDirection {
    /// Import filters (used to load documents).
    Import,
    /// Export filters (used to store documents).
    Export,
}

impl fmt::Display for FilterDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Import => write!(f, "import"),
            Self::Export => write!(f, "export"),
        }
    }
}

/// Unified error type for all conversion operations.
#[derive(Debug, Error)]
pub enum ConversionError {
    // --- Session errors ---
    /// The bridge to the engine could not be established.
    #[error("Failed to bootstrap office session: {0}")]
    SessionBootstrap(#[source] BridgeError),

    // --- Request errors ---
    /// A caller-supplied filter name is not in that direction's alias table.
    #[error("There is no '{name}' {direction} filter. Available filters: {available:?}")]
    InvalidFilterName {
        /// Catalog the name was looked up in.
        direction: FilterDirection,
        /// The name that was not found.
        name: String,
        /// Valid names, sorted.
        available: Vec<String>,
    },

    /// The resolved input path does not exist.
    #[error("Path {path} does not exist.")]
    InputNotFound {
        /// The missing path.
        path: PathBuf,
    },

    // --- Engine errors ---
    /// The engine returned no document for the input.
    #[error("Could not load document {source_name} using the {filter} filter.")]
    DocumentLoad {
        /// Input path, or `<remote file>` for in-memory input.
        source_name: String,
        /// Import filter requested, or `default`.
        filter: String,
    },

    /// The document's services do not include any known document type.
    #[error(
        "The input document is of an unknown document type (services: {services:?}). \
         This usually means the engine introduced a new document type \
         or the input is not a document."
    )]
    UnknownDocumentType {
        /// Service names the document reported.
        services: Vec<String>,
    },

    /// Type detection could not classify the output location.
    #[error("Unknown export file type, unknown extension '{extension}'")]
    UnknownExportType {
        /// Extension that could not be classified.
        extension: String,
    },

    /// No export filter exists for the source/target type pair.
    #[error("Could not find an export filter from {import_type} to {export_type}")]
    FilterResolution {
        /// Document service of the loaded document.
        import_type: String,
        /// Type name of the output location.
        export_type: String,
    },

    /// The produced output is smaller than the configured minimum.
    #[error("Output file is too small ({size} bytes, minimum {minimum}): {path}")]
    OutputTooSmall {
        /// Output path.
        path: PathBuf,
        /// Actual size.
        size: u64,
        /// Configured minimum.
        minimum: u64,
    },

    // --- Service errors ---
    /// Semaphore was closed unexpectedly.
    #[error("Internal semaphore error: {reason}")]
    SemaphoreClosed {
        /// Description of which semaphore failed.
        reason: String,
    },

    // --- Generic errors ---
    /// A bridge call failed mid-conversion.
    #[error("Office engine error: {0}")]
    Bridge(#[from] BridgeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<ConversionError> for AppError {
    fn from(err: ConversionError) -> Self {
        match &err {
            ConversionError::InvalidFilterName { .. }
            | ConversionError::UnknownExportType { .. } => AppError::validation(err.to_string()),
            ConversionError::InputNotFound { .. } => AppError::not_found(err.to_string()),
            ConversionError::SessionBootstrap(_) => AppError::service_unavailable(err.to_string()),
            ConversionError::DocumentLoad { .. }
            | ConversionError::UnknownDocumentType { .. }
            | ConversionError::FilterResolution { .. }
            | ConversionError::OutputTooSmall { .. }
            | ConversionError::Bridge(_) => AppError::external_service(err.to_string()),
            ConversionError::Io(_) => AppError::storage(err.to_string()),
            _ => AppError::internal(err.to_string()),
        }
    }
}
