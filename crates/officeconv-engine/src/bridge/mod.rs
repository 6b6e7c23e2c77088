//! Seam between the conversion core and the remote office engine.
//!
//! The transport that actually talks to the engine process lives behind
//! [`OfficeBridge`]. The core only ever sees the handful of engine services
//! it needs: the desktop (document loading), the filter factory (filter
//! catalog), and type detection (URL to type name).

#[cfg(any(test, feature = "mock"))]
pub mod mock;

mod property;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use property::{PropertyValue, PropertyValueKind, prop_lookup};

/// Errors reported by a bridge implementation.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The bridge could not resolve the remote component context.
    #[error("Cannot connect to office engine at {address}: {reason}")]
    Connection {
        /// Connection string that failed to resolve.
        address: String,
        /// Transport-specific detail.
        reason: String,
    },

    /// The remote object does not implement the requested interface.
    #[error("Remote object does not support {interface}")]
    Unsupported {
        /// Name of the missing interface.
        interface: &'static str,
    },

    /// The engine raised an error while executing a call.
    #[error("Remote call failed: {0}")]
    Remote(String),
}

/// Address of an engine's socket acceptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BridgeAddress {
    /// Host or interface the engine listens on.
    pub interface: String,
    /// Acceptor port.
    pub port: u16,
}

impl BridgeAddress {
    /// Create an address.
    pub fn new(interface: impl Into<String>, port: u16) -> Self {
        Self {
            interface: interface.into(),
            port,
        }
    }

    /// Connection string understood by the engine's URL resolver.
    pub fn connection_string(&self) -> String {
        format!(
            "uno:socket,host={},port={};urp;StarOffice.ComponentContext",
            self.interface, self.port
        )
    }
}

impl Default for BridgeAddress {
    fn default() -> Self {
        Self::new("127.0.0.1", 2002)
    }
}

impl fmt::Display for BridgeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.interface, self.port)
    }
}

/// Resolves a connection to a running office engine.
pub trait OfficeBridge: Send + Sync + fmt::Debug {
    /// Resolve the remote component context at `address`.
    fn resolve(&self, address: &BridgeAddress) -> Result<Arc<dyn RemoteContext>, BridgeError>;
}

/// The remote component context: factory for the engine services.
pub trait RemoteContext: Send + Sync + fmt::Debug {
    /// The desktop service, used to load documents.
    fn desktop(&self) -> Result<Arc<dyn Desktop>, BridgeError>;

    /// The filter factory, used to enumerate the filter catalog.
    fn filter_factory(&self) -> Result<Arc<dyn FilterFactory>, BridgeError>;

    /// The type detection service, used to map URLs to type names.
    fn type_detection(&self) -> Result<Arc<dyn TypeDetection>, BridgeError>;
}

/// Document loader.
pub trait Desktop: Send + Sync + fmt::Debug {
    /// Load the component at `url` into a hidden default frame.
    ///
    /// `Ok(None)` means the engine accepted the call but produced no document.
    fn load_component(
        &self,
        url: &str,
        properties: &[PropertyValue],
    ) -> Result<Option<Box<dyn RemoteDocument>>, BridgeError>;
}

/// Filter catalog access.
pub trait FilterFactory: Send + Sync + fmt::Debug {
    /// Run a catalog query, returning one property set per matching filter
    /// in catalog order.
    fn query(&self, query: &str) -> Result<Vec<Vec<PropertyValue>>, BridgeError>;
}

/// Type detection.
pub trait TypeDetection: Send + Sync + fmt::Debug {
    /// Internal type name for `url`; empty when the type is unknown.
    fn query_type_by_url(&self, url: &str) -> Result<String, BridgeError>;
}

/// A document opened in the remote engine.
pub trait RemoteDocument: Send + fmt::Debug {
    /// Service names the document model supports.
    fn supported_service_names(&self) -> Result<Vec<String>, BridgeError>;

    /// Refresh the document's data.
    ///
    /// Returns [`BridgeError::Unsupported`] for documents that cannot refresh.
    fn refresh(&mut self) -> Result<(), BridgeError>;

    /// Number of document indexes (tables of contents, bibliographies, ...).
    ///
    /// Returns [`BridgeError::Unsupported`] for documents without indexes.
    fn document_index_count(&mut self) -> Result<usize, BridgeError>;

    /// Update the document index at position `index`.
    fn update_document_index(&mut self, index: usize) -> Result<(), BridgeError>;

    /// Store a copy of the document at `url`.
    fn store_to_url(&mut self, url: &str, properties: &[PropertyValue])
    -> Result<(), BridgeError>;

    /// Close the document, handing ownership back to the engine.
    fn close(&mut self, deliver_ownership: bool) -> Result<(), BridgeError>;
}

/// Convert a local filesystem path into a `file://` URL.
pub fn path_to_file_url(path: &Path) -> Result<String, std::io::Error> {
    let absolute = std::path::absolute(path)?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Path cannot be expressed as a file URL: {}", absolute.display()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string() {
        let address = BridgeAddress::new("localhost", 2003);
        assert_eq!(
            address.connection_string(),
            "uno:socket,host=localhost,port=2003;urp;StarOffice.ComponentContext"
        );
        assert_eq!(address.to_string(), "localhost:2003");
    }

    #[test]
    fn test_path_to_file_url_escapes() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("annual report.odt");
        let url = path_to_file_url(&path).expect("url");
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("annual%20report.odt"));
    }

    #[test]
    fn test_path_to_file_url_relative_is_absolutised() {
        let url = path_to_file_url(Path::new("relative.docx")).expect("url");
        assert!(url.starts_with("file:///"));
        assert!(url.ends_with("/relative.docx"));
    }
}
