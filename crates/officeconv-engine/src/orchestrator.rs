//! The load → refresh → resolve → export → close pipeline.
//!
//! One call converts one document, strictly in sequence. The opened
//! document is owned by a guard that closes it exactly once on every exit
//! path, and temporary files are removed when their [`TempResource`]s drop.

use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use officeconv_core::config::conversion::ConversionConfig;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::bridge::{BridgeError, PropertyValue, RemoteDocument, path_to_file_url};
use crate::doc_type::{self, DocumentType};
use crate::error::{ConversionError, FilterDirection};
use crate::models::{ConversionOutput, ConversionRequest};
use crate::options::ExportOptionSet;
use crate::session::RemoteOfficeSession;
use crate::temp::TempResource;

/// Index refresh passes: the first update can grow tables of contents and
/// shift page numbers, the second picks up the shifted numbers.
const INDEX_REFRESH_PASSES: usize = 2;

/// Runs conversions against one engine session.
///
/// `convert` takes `&mut self`: a session handles one document at a time.
#[derive(Debug)]
pub struct ConversionOrchestrator {
    session: RemoteOfficeSession,
    temp_root: PathBuf,
    min_output_bytes: u64,
}

impl ConversionOrchestrator {
    /// Create an orchestrator with default settings.
    pub fn new(session: RemoteOfficeSession) -> Self {
        Self::with_config(session, &ConversionConfig::default())
    }

    /// Create an orchestrator using `config` for temp files and output checks.
    pub fn with_config(session: RemoteOfficeSession, config: &ConversionConfig) -> Self {
        Self {
            session,
            temp_root: config.effective_temp_root(),
            min_output_bytes: config.min_output_bytes,
        }
    }

    /// The underlying session.
    pub fn session(&self) -> &RemoteOfficeSession {
        &self.session
    }

    /// Convert one document.
    ///
    /// Returns the converted bytes when `request.output_path` is unset,
    /// otherwise writes the file and returns its path.
    #[instrument(skip(self, request), fields(conversion_id = %Uuid::now_v7().simple()))]
    pub fn convert(
        &mut self,
        request: &ConversionRequest,
    ) -> Result<ConversionOutput, ConversionError> {
        // Input resolution
        let mut load_properties = vec![PropertyValue::new("ReadOnly", true)];
        if let Some(name) = &request.import_filter {
            let canonical = self.lookup_filter(FilterDirection::Import, name)?;
            load_properties.push(PropertyValue::new("FilterName", canonical));
        }

        let input = TempResource::acquire(
            request.effective_input_path(),
            &self.temp_root,
            "",
            request.effective_input_bytes(),
        )?;

        // The engine reports missing files poorly, so check first
        if !input.path().exists() {
            return Err(ConversionError::InputNotFound {
                path: input.path().to_path_buf(),
            });
        }

        info!(path = %input.path().display(), "Opening document for input");
        let import_url = path_to_file_url(input.path())?;
        let mut document = match self.session.load_document(&import_url, &load_properties)? {
            Some(document) => DocumentGuard::new(document),
            None => {
                let err = ConversionError::DocumentLoad {
                    source_name: request
                        .effective_input_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "<remote file>".to_string()),
                    filter: request
                        .import_filter
                        .clone()
                        .unwrap_or_else(|| "default".to_string()),
                };
                error!(error = %err, "Document load failed");
                return Err(err);
            }
        };

        if request.update_index {
            refresh_document_indexes(&mut **document)?;
        }

        let import_type = doc_type::classify(&**document)?;
        debug!(%import_type, "Classified input document");

        let output = TempResource::acquire(
            request.output_path.as_deref(),
            &self.temp_root,
            &request.output_suffix(),
            None,
        )?;
        let export_url = path_to_file_url(output.path())?;
        let export_type = self.session.query_type(&export_url)?.ok_or_else(|| {
            ConversionError::UnknownExportType {
                extension: request.reported_extension(output.path()),
            }
        })?;

        let filter_name = self.select_export_filter(request, import_type, &export_type)?;

        info!(path = %output.path().display(), "Exporting document");
        info!(
            filter = %filter_name,
            import_filter = request.import_filter.as_deref().unwrap_or("default"),
            %export_type,
            "Using export filter"
        );

        let options = ExportOptionSet::parse(&request.filter_options);
        let store_properties = options.to_store_properties(&filter_name);
        document.store_to_url(&export_url, &store_properties)?;

        let size = std::fs::metadata(output.path())?.len();
        if size < self.min_output_bytes {
            return Err(ConversionError::OutputTooSmall {
                path: output.path().to_path_buf(),
                size,
                minimum: self.min_output_bytes,
            });
        }

        if output.is_temporary() {
            Ok(ConversionOutput::Bytes(std::fs::read(output.path())?))
        } else {
            Ok(ConversionOutput::Written(output.path().to_path_buf()))
        }
    }

    /// Canonical name for a caller-supplied filter name or alias.
    fn lookup_filter(
        &self,
        direction: FilterDirection,
        name: &str,
    ) -> Result<String, ConversionError> {
        let table = self.session.filters().filter_names(direction)?;
        match table.resolve(name) {
            Some(canonical) => Ok(canonical.to_string()),
            None => Err(ConversionError::InvalidFilterName {
                direction,
                name: name.to_string(),
                available: table.sorted_names(),
            }),
        }
    }

    fn select_export_filter(
        &self,
        request: &ConversionRequest,
        import_type: DocumentType,
        export_type: &str,
    ) -> Result<String, ConversionError> {
        if let Some(name) = &request.export_filter {
            return self.lookup_filter(FilterDirection::Export, name);
        }

        self.session
            .filters()
            .resolve_filter(import_type.service_name(), export_type)?
            .ok_or_else(|| ConversionError::FilterResolution {
                import_type: import_type.service_name().to_string(),
                export_type: export_type.to_string(),
            })
    }
}

/// Update every document index, twice.
///
/// Documents that cannot refresh or have no indexes end the loop quietly.
fn refresh_document_indexes(document: &mut dyn RemoteDocument) -> Result<(), ConversionError> {
    for pass in 0..INDEX_REFRESH_PASSES {
        let count = match refresh_and_count(document) {
            Ok(count) => count,
            Err(BridgeError::Unsupported { interface }) => {
                debug!(interface, "Document does not support index refresh");
                break;
            }
            Err(e) => return Err(e.into()),
        };

        for index in 0..count {
            document.update_document_index(index)?;
        }
        debug!(pass, count, "Updated document indexes");
    }
    Ok(())
}

fn refresh_and_count(document: &mut dyn RemoteDocument) -> Result<usize, BridgeError> {
    document.refresh()?;
    document.document_index_count()
}

/// Owns an opened document and closes it when dropped.
struct DocumentGuard {
    document: Box<dyn RemoteDocument>,
}

impl DocumentGuard {
    fn new(document: Box<dyn RemoteDocument>) -> Self {
        Self { document }
    }
}

impl Deref for DocumentGuard {
    type Target = Box<dyn RemoteDocument>;

    fn deref(&self) -> &Self::Target {
        &self.document
    }
}

impl DerefMut for DocumentGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.document
    }
}

impl Drop for DocumentGuard {
    fn drop(&mut self) {
        if let Err(e) = self.document.close(true) {
            warn!(error = %e, "Failed to close document");
        }
    }
}
