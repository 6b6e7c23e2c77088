//! In-memory office engine for development and testing.
//!
//! Simulates the engine services behind [`OfficeBridge`] without a running
//! office process: a small LibreOffice-like filter catalog, extension-based
//! type detection, content sniffing on load, and file output on store.
//! Counters expose how often the expensive remote calls were made.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing;
use url::Url;

use super::{
    BridgeAddress, BridgeError, Desktop, FilterFactory, OfficeBridge, PropertyValue,
    PropertyValueKind, RemoteContext, RemoteDocument, TypeDetection, prop_lookup,
};
use crate::doc_type::DocumentType;
use crate::filters::{SFX_FILTER_EXPORT, SFX_FILTER_IMPORT};

/// Header line marking a document written by the mock engine.
pub const MOCK_DOC_HEADER: &str = "MOCKDOC ";
/// Signature written at the start of PDF output.
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";
/// Type name the mock assigns to `.pdf` locations.
pub const PDF_TYPE: &str = "pdf_Portable_Document_Format";

/// A catalog entry of the mock engine.
#[derive(Debug, Clone)]
pub struct MockFilter {
    /// Canonical filter name.
    pub name: String,
    /// Owning document service.
    pub document_service: String,
    /// Type name.
    pub type_name: String,
    /// Aliases and junk metadata.
    pub user_data: Vec<String>,
    /// Import/export flags.
    pub flags: i64,
}

impl MockFilter {
    /// Create a catalog entry.
    pub fn new(
        name: &str,
        document_type: DocumentType,
        type_name: &str,
        user_data: &[&str],
        flags: i64,
    ) -> Self {
        Self {
            name: name.to_string(),
            document_service: document_type.service_name().to_string(),
            type_name: type_name.to_string(),
            user_data: user_data.iter().map(|s| s.to_string()).collect(),
            flags,
        }
    }

    fn to_properties(&self) -> Vec<PropertyValue> {
        vec![
            PropertyValue::new("Name", self.name.as_str()),
            PropertyValue::new("DocumentService", self.document_service.as_str()),
            PropertyValue::new("Type", self.type_name.as_str()),
            PropertyValue::new("UserData", PropertyValueKind::StrList(self.user_data.clone())),
            PropertyValue::new("Flags", self.flags),
        ]
    }
}

#[derive(Debug)]
struct MockState {
    filters: Mutex<Vec<MockFilter>>,
    types: Mutex<HashMap<String, String>>,
    refuse_connections: AtomicBool,
    fail_loads: AtomicBool,
    catalog_queries: AtomicUsize,
    loads: AtomicUsize,
    closes: AtomicUsize,
    refreshes: AtomicUsize,
    index_updates: AtomicUsize,
    last_load: Mutex<Option<Vec<PropertyValue>>>,
    last_store: Mutex<Option<Vec<PropertyValue>>>,
}

/// Mock office engine; clones share state.
#[derive(Debug, Clone)]
pub struct MockOfficeEngine {
    state: Arc<MockState>,
}

impl MockOfficeEngine {
    /// Engine with the default catalog and type table.
    pub fn new() -> Self {
        let engine = Self::empty();
        {
            let mut filters = engine.state.filters.lock().unwrap_or_else(|e| e.into_inner());
            *filters = default_filters();
            let mut types = engine.state.types.lock().unwrap_or_else(|e| e.into_inner());
            *types = default_types();
        }
        engine
    }

    /// Engine with no filters and no known types.
    pub fn empty() -> Self {
        Self {
            state: Arc::new(MockState {
                filters: Mutex::new(Vec::new()),
                types: Mutex::new(HashMap::new()),
                refuse_connections: AtomicBool::new(false),
                fail_loads: AtomicBool::new(false),
                catalog_queries: AtomicUsize::new(0),
                loads: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                refreshes: AtomicUsize::new(0),
                index_updates: AtomicUsize::new(0),
                last_load: Mutex::new(None),
                last_store: Mutex::new(None),
            }),
        }
    }

    /// Add a catalog entry (for testing).
    pub fn add_filter(&self, filter: MockFilter) {
        let mut filters = self.state.filters.lock().unwrap_or_else(|e| e.into_inner());
        filters.push(filter);
    }

    /// Map a file extension to a type name (for testing).
    pub fn add_type(&self, extension: &str, type_name: &str) {
        let mut types = self.state.types.lock().unwrap_or_else(|e| e.into_inner());
        types.insert(extension.to_ascii_lowercase(), type_name.to_string());
    }

    /// Make `resolve` fail as if no engine were listening.
    pub fn set_refuse_connections(&self, refuse: bool) {
        self.state.refuse_connections.store(refuse, Ordering::SeqCst);
    }

    /// Make every load return no document.
    pub fn set_fail_loads(&self, fail: bool) {
        self.state.fail_loads.store(fail, Ordering::SeqCst);
    }

    /// Filter factory over this engine's catalog.
    pub fn filter_factory_handle(&self) -> Arc<dyn FilterFactory> {
        Arc::new(MockContext {
            state: Arc::clone(&self.state),
        })
    }

    /// Number of catalog queries made.
    pub fn catalog_queries(&self) -> usize {
        self.state.catalog_queries.load(Ordering::SeqCst)
    }

    /// Number of load calls made.
    pub fn loads(&self) -> usize {
        self.state.loads.load(Ordering::SeqCst)
    }

    /// Number of documents closed.
    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Number of refresh calls that succeeded.
    pub fn refreshes(&self) -> usize {
        self.state.refreshes.load(Ordering::SeqCst)
    }

    /// Number of index updates made.
    pub fn index_updates(&self) -> usize {
        self.state.index_updates.load(Ordering::SeqCst)
    }

    /// Properties passed to the most recent load.
    pub fn last_load_properties(&self) -> Option<Vec<PropertyValue>> {
        self.state
            .last_load
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Properties passed to the most recent store.
    pub fn last_store_properties(&self) -> Option<Vec<PropertyValue>> {
        self.state
            .last_store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockOfficeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OfficeBridge for MockOfficeEngine {
    fn resolve(&self, address: &BridgeAddress) -> Result<Arc<dyn RemoteContext>, BridgeError> {
        if self.state.refuse_connections.load(Ordering::SeqCst) {
            return Err(BridgeError::Connection {
                address: address.connection_string(),
                reason: "Connection refused".to_string(),
            });
        }
        tracing::info!("[MockOffice] Resolved context at {}", address);
        Ok(Arc::new(MockContext {
            state: Arc::clone(&self.state),
        }))
    }
}

#[derive(Debug)]
struct MockContext {
    state: Arc<MockState>,
}

impl RemoteContext for MockContext {
    fn desktop(&self) -> Result<Arc<dyn Desktop>, BridgeError> {
        Ok(Arc::new(MockContext {
            state: Arc::clone(&self.state),
        }))
    }

    fn filter_factory(&self) -> Result<Arc<dyn FilterFactory>, BridgeError> {
        Ok(Arc::new(MockContext {
            state: Arc::clone(&self.state),
        }))
    }

    fn type_detection(&self) -> Result<Arc<dyn TypeDetection>, BridgeError> {
        Ok(Arc::new(MockContext {
            state: Arc::clone(&self.state),
        }))
    }
}

impl FilterFactory for MockContext {
    fn query(&self, query: &str) -> Result<Vec<Vec<PropertyValue>>, BridgeError> {
        self.state.catalog_queries.fetch_add(1, Ordering::SeqCst);

        let flag = query
            .rsplit_once("iflags=")
            .and_then(|(_, v)| v.parse::<i64>().ok())
            .ok_or_else(|| BridgeError::Remote(format!("Unsupported catalog query: {query}")))?;

        let filters = self.state.filters.lock().unwrap_or_else(|e| e.into_inner());
        let mut selected: Vec<&MockFilter> =
            filters.iter().filter(|f| f.flags & flag != 0).collect();
        selected.sort_by(|a, b| a.name.cmp(&b.name));

        tracing::debug!("[MockOffice] Catalog query '{}' -> {} filters", query, selected.len());
        Ok(selected.into_iter().map(MockFilter::to_properties).collect())
    }
}

impl TypeDetection for MockContext {
    fn query_type_by_url(&self, url: &str) -> Result<String, BridgeError> {
        let path = url_to_path(url)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let types = self.state.types.lock().unwrap_or_else(|e| e.into_inner());
        Ok(types.get(&extension).cloned().unwrap_or_default())
    }
}

impl Desktop for MockContext {
    fn load_component(
        &self,
        url: &str,
        properties: &[PropertyValue],
    ) -> Result<Option<Box<dyn RemoteDocument>>, BridgeError> {
        self.state.loads.fetch_add(1, Ordering::SeqCst);
        *self.state.last_load.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(properties.to_vec());

        if self.state.fail_loads.load(Ordering::SeqCst) {
            tracing::warn!("[MockOffice] Refusing to load {}", url);
            return Ok(None);
        }

        let path = url_to_path(url)?;
        let content = match std::fs::read(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("[MockOffice] Cannot read {}: {}", path.display(), e);
                return Ok(None);
            }
        };
        if content.is_empty() {
            return Ok(None);
        }

        let filter_name = prop_lookup(properties, "FilterName").and_then(PropertyValueKind::as_str);
        let service = self.detect_service(&path, &content, filter_name);
        let body = strip_mock_header(&content).to_vec();

        tracing::info!("[MockOffice] Loaded {} as {}", path.display(), service);
        Ok(Some(Box::new(MockDocument {
            state: Arc::clone(&self.state),
            service,
            body,
            closed: false,
        })))
    }
}

impl MockContext {
    fn detect_service(&self, path: &Path, content: &[u8], filter_name: Option<&str>) -> String {
        if let Some(service) = mock_header_service(content) {
            return service;
        }
        if content.starts_with(PDF_SIGNATURE) {
            return DocumentType::Drawing.service_name().to_string();
        }

        let filters = self.state.filters.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(filter) = filter_name.and_then(|n| filters.iter().find(|f| f.name == n)) {
            return filter.document_service.clone();
        }

        let types = self.state.types.lock().unwrap_or_else(|e| e.into_inner());
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| types.get(&e.to_ascii_lowercase()))
            .and_then(|t| {
                filters
                    .iter()
                    .find(|f| &f.type_name == t && f.flags & SFX_FILTER_IMPORT != 0)
            });

        match by_extension {
            Some(filter) => filter.document_service.clone(),
            None => DocumentType::Text.service_name().to_string(),
        }
    }
}

#[derive(Debug)]
struct MockDocument {
    state: Arc<MockState>,
    service: String,
    body: Vec<u8>,
    closed: bool,
}

impl MockDocument {
    fn is_text(&self) -> bool {
        self.service == DocumentType::Text.service_name()
    }

    fn ensure_open(&self) -> Result<(), BridgeError> {
        if self.closed {
            return Err(BridgeError::Remote("Document is already disposed".to_string()));
        }
        Ok(())
    }
}

impl RemoteDocument for MockDocument {
    fn supported_service_names(&self) -> Result<Vec<String>, BridgeError> {
        self.ensure_open()?;
        Ok(vec![
            "com.sun.star.document.OfficeDocument".to_string(),
            self.service.clone(),
        ])
    }

    fn refresh(&mut self) -> Result<(), BridgeError> {
        self.ensure_open()?;
        if !self.is_text() {
            return Err(BridgeError::Unsupported {
                interface: "com.sun.star.util.XRefreshable",
            });
        }
        self.state.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn document_index_count(&mut self) -> Result<usize, BridgeError> {
        self.ensure_open()?;
        if !self.is_text() {
            return Err(BridgeError::Unsupported {
                interface: "com.sun.star.text.XDocumentIndexesSupplier",
            });
        }
        Ok(1)
    }

    fn update_document_index(&mut self, _index: usize) -> Result<(), BridgeError> {
        self.ensure_open()?;
        self.state.index_updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn store_to_url(&mut self, url: &str, properties: &[PropertyValue]) -> Result<(), BridgeError> {
        self.ensure_open()?;
        *self.state.last_store.lock().unwrap_or_else(|e| e.into_inner()) =
            Some(properties.to_vec());

        let filter_name = prop_lookup(properties, "FilterName")
            .and_then(PropertyValueKind::as_str)
            .ok_or_else(|| BridgeError::Remote("No FilterName given".to_string()))?;

        let filter = {
            let filters = self.state.filters.lock().unwrap_or_else(|e| e.into_inner());
            filters
                .iter()
                .find(|f| f.name == filter_name && f.flags & SFX_FILTER_EXPORT != 0)
                .cloned()
                .ok_or_else(|| BridgeError::Remote(format!("Unknown export filter {filter_name}")))?
        };

        let mut output = Vec::with_capacity(self.body.len() + 32);
        if filter.type_name == PDF_TYPE {
            output.extend_from_slice(b"%PDF-1.7\n%mock\n");
        } else {
            output.extend_from_slice(MOCK_DOC_HEADER.as_bytes());
            output.extend_from_slice(filter.document_service.as_bytes());
            output.push(b'\n');
        }
        output.extend_from_slice(&self.body);

        let path = url_to_path(url)?;
        std::fs::write(&path, output).map_err(|e| BridgeError::Remote(e.to_string()))?;
        tracing::info!("[MockOffice] Stored {} with {}", path.display(), filter_name);
        Ok(())
    }

    fn close(&mut self, _deliver_ownership: bool) -> Result<(), BridgeError> {
        self.ensure_open()?;
        self.closed = true;
        self.state.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn url_to_path(url: &str) -> Result<PathBuf, BridgeError> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.to_file_path().ok())
        .ok_or_else(|| BridgeError::Remote(format!("Not a file URL: {url}")))
}

fn mock_header_service(content: &[u8]) -> Option<String> {
    let rest = content.strip_prefix(MOCK_DOC_HEADER.as_bytes())?;
    let end = rest.iter().position(|b| *b == b'\n').unwrap_or(rest.len());
    std::str::from_utf8(&rest[..end]).ok().map(str::to_string)
}

fn strip_mock_header(content: &[u8]) -> &[u8] {
    if !content.starts_with(MOCK_DOC_HEADER.as_bytes()) {
        return content;
    }
    match content.iter().position(|b| *b == b'\n') {
        Some(pos) => &content[pos + 1..],
        None => &[],
    }
}

fn default_filters() -> Vec<MockFilter> {
    use DocumentType::*;
    let both = SFX_FILTER_IMPORT | SFX_FILTER_EXPORT;
    let export = SFX_FILTER_EXPORT;

    vec![
        MockFilter::new("writer8", Text, "writer8", &["", "true", "odt"], both),
        MockFilter::new("MS Word 2007 XML", Text, "writer_MS_Word_2007", &["docx"], both),
        MockFilter::new("Text", Text, "writer_Text", &["txt"], both),
        MockFilter::new(
            "writer_pdf_Export",
            Text,
            PDF_TYPE,
            &["", "/opt/office/share/config/pdf.xcd", "true"],
            export,
        ),
        MockFilter::new("HTML (StarWriter)", Text, "generic_HTML", &["html", "xhtml.xsl"], export),
        MockFilter::new("calc8", Spreadsheet, "calc8", &["ods"], both),
        MockFilter::new(
            "Calc MS Excel 2007 XML",
            Spreadsheet,
            "calc_MS_Excel_2007_XML",
            &["xlsx"],
            both,
        ),
        MockFilter::new(
            "Text - txt - csv (StarCalc)",
            Spreadsheet,
            "calc_Text_txt_csv_StarCalc",
            &["csv"],
            both,
        ),
        MockFilter::new("calc_pdf_Export", Spreadsheet, PDF_TYPE, &[""], export),
        MockFilter::new("impress8", Presentation, "impress8", &["odp"], both),
        MockFilter::new(
            "Impress MS PowerPoint 2007 XML",
            Presentation,
            "impress_MS_PowerPoint_2007_XML",
            &["pptx"],
            both,
        ),
        MockFilter::new("impress_pdf_Export", Presentation, PDF_TYPE, &[], export),
        MockFilter::new("draw8", Drawing, "draw8", &["odg"], both),
        MockFilter::new("draw_pdf_Export", Drawing, PDF_TYPE, &[], export),
    ]
}

fn default_types() -> HashMap<String, String> {
    [
        ("odt", "writer8"),
        ("docx", "writer_MS_Word_2007"),
        ("txt", "writer_Text"),
        ("html", "generic_HTML"),
        ("ods", "calc8"),
        ("xlsx", "calc_MS_Excel_2007_XML"),
        ("csv", "calc_Text_txt_csv_StarCalc"),
        ("odp", "impress8"),
        ("pptx", "impress_MS_PowerPoint_2007_XML"),
        ("odg", "draw8"),
        ("pdf", PDF_TYPE),
    ]
    .into_iter()
    .map(|(ext, t)| (ext.to_string(), t.to_string()))
    .collect()
}
