//! # officeconv-engine
//!
//! Converts office documents between formats by driving a running office
//! engine through its remote bridge.
//!
//! The engine exposes document loading, its filter catalog, and type
//! detection as separate services. This crate cross-references them to pick
//! a conversion path:
//!
//! 1. the document is loaded (optionally with an explicit import filter),
//! 2. document indexes are refreshed in two passes,
//! 3. its document service is classified ([`DocumentType`]),
//! 4. type detection names the output type,
//! 5. the export filter for that pair is looked up in the cached catalog
//!    ([`FilterRegistry`]), and
//! 6. the document is stored with the parsed export options.
//!
//! The bridge transport itself sits behind [`bridge::OfficeBridge`]; an
//! in-memory engine is available as [`bridge::mock::MockOfficeEngine`] with
//! the `mock` feature.

pub mod bridge;
pub mod doc_type;
pub mod error;
pub mod filters;
pub mod metrics;
pub mod models;
pub mod options;
pub mod orchestrator;
pub mod service;
pub mod session;
pub mod temp;

pub use doc_type::DocumentType;
pub use error::{ConversionError, FilterDirection};
pub use filters::{FilterAliasTable, FilterDescriptor, FilterRegistry};
pub use models::{ConversionOutput, ConversionRequest};
pub use options::ExportOptionSet;
pub use orchestrator::ConversionOrchestrator;
pub use service::ConverterService;
pub use session::RemoteOfficeSession;
pub use temp::TempResource;
