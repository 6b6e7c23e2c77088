//! Semantic document types and classification of opened documents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bridge::RemoteDocument;
use crate::error::ConversionError;

/// Document services the engine is known to produce.
///
/// The set is closed: a document supporting none of these services is
/// reported, never guessed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// Spreadsheet (Calc).
    Spreadsheet,
    /// Text document (Writer).
    Text,
    /// Presentation (Impress).
    Presentation,
    /// Drawing (Draw).
    Drawing,
    /// Database data source (Base).
    DatabaseSource,
    /// Formula (Math).
    Formula,
    /// Basic IDE.
    BasicIde,
    /// HTML document (Writer/Web).
    WebDocument,
}

impl DocumentType {
    /// All variants, in classification priority order.
    pub const ALL: [DocumentType; 8] = [
        DocumentType::Spreadsheet,
        DocumentType::Text,
        DocumentType::Presentation,
        DocumentType::Drawing,
        DocumentType::DatabaseSource,
        DocumentType::Formula,
        DocumentType::BasicIde,
        DocumentType::WebDocument,
    ];

    /// The engine's service name for this type.
    pub fn service_name(&self) -> &'static str {
        match self {
            Self::Spreadsheet => "com.sun.star.sheet.SpreadsheetDocument",
            Self::Text => "com.sun.star.text.TextDocument",
            Self::Presentation => "com.sun.star.presentation.PresentationDocument",
            Self::Drawing => "com.sun.star.drawing.DrawingDocument",
            Self::DatabaseSource => "com.sun.star.sdb.DocumentDataSource",
            Self::Formula => "com.sun.star.formula.FormulaProperties",
            Self::BasicIde => "com.sun.star.script.BasicIDE",
            Self::WebDocument => "com.sun.star.text.WebDocument",
        }
    }

    /// Parse an engine service name.
    pub fn from_service_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.service_name() == name)
    }

    /// Pick the known type among `services`.
    ///
    /// When several known services are present the first in [`Self::ALL`]
    /// order wins.
    pub fn from_services<S: AsRef<str>>(services: &[S]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| services.iter().any(|s| s.as_ref() == t.service_name()))
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.service_name())
    }
}

/// Classify an opened document by the services it supports.
pub fn classify(document: &dyn RemoteDocument) -> Result<DocumentType, ConversionError> {
    let services = document.supported_service_names()?;
    DocumentType::from_services(&services)
        .ok_or(ConversionError::UnknownDocumentType { services })
}
