//! Conversion requests and results.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One conversion to perform.
///
/// Input comes from `input_path` or, when no path is given, `input_bytes`.
/// The output goes to `output_path`, or to a temporary file with
/// `target_extension` whose bytes are returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// Local path of the document to convert.
    pub input_path: Option<PathBuf>,
    /// Document content; ignored when `input_path` is set.
    #[serde(skip)]
    pub input_bytes: Option<Vec<u8>>,
    /// Where to write the result.
    pub output_path: Option<PathBuf>,
    /// Extension of the desired type (`"pdf"`, `"xlsx"`, ...).
    pub target_extension: Option<String>,
    /// Export filter name or alias; auto-detected when absent.
    pub export_filter: Option<String>,
    /// Import filter name or alias; engine default when absent.
    pub import_filter: Option<String>,
    /// `Name=Value` or bare export filter options.
    pub filter_options: Vec<String>,
    /// Refresh document indexes before exporting.
    pub update_index: bool,
}

impl Default for ConversionRequest {
    fn default() -> Self {
        Self {
            input_path: None,
            input_bytes: None,
            output_path: None,
            target_extension: None,
            export_filter: None,
            import_filter: None,
            filter_options: Vec::new(),
            update_index: true,
        }
    }
}

impl ConversionRequest {
    /// Request converting the file at `path`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Request converting in-memory content.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            input_bytes: Some(data.into()),
            ..Default::default()
        }
    }

    /// Write the result to `path`.
    pub fn write_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Return the result as bytes of type `extension`.
    pub fn convert_to(mut self, extension: impl Into<String>) -> Self {
        self.target_extension = Some(extension.into());
        self
    }

    /// Use a specific export filter.
    pub fn with_export_filter(mut self, name: impl Into<String>) -> Self {
        self.export_filter = Some(name.into());
        self
    }

    /// Use a specific import filter.
    pub fn with_import_filter(mut self, name: impl Into<String>) -> Self {
        self.import_filter = Some(name.into());
        self
    }

    /// Append an export filter option.
    pub fn with_option(mut self, option: impl Into<String>) -> Self {
        self.filter_options.push(option.into());
        self
    }

    /// Enable or disable the index refresh.
    pub fn with_update_index(mut self, update_index: bool) -> Self {
        self.update_index = update_index;
        self
    }

    /// Input path, with an empty path treated as absent.
    pub fn effective_input_path(&self) -> Option<&Path> {
        self.input_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Input bytes, unless a path takes precedence.
    pub fn effective_input_bytes(&self) -> Option<&[u8]> {
        match self.effective_input_path() {
            Some(_) => None,
            None => self.input_bytes.as_deref(),
        }
    }

    /// Suffix for a temporary output file (`".pdf"`), empty if unknown.
    pub fn output_suffix(&self) -> String {
        self.target_extension
            .as_deref()
            .map(|ext| format!(".{}", ext.trim_start_matches('.')))
            .unwrap_or_default()
    }

    /// Extension to name when type detection fails.
    ///
    /// Prefers `target_extension`, else the extension of `output`.
    pub fn reported_extension(&self, output: &Path) -> String {
        match &self.target_extension {
            Some(ext) => ext.clone(),
            None => output
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutput {
    /// Converted content (no output path was given).
    Bytes(Vec<u8>),
    /// The result was written to this caller-supplied path.
    Written(PathBuf),
}

impl ConversionOutput {
    /// Converted content, if it was returned in memory.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(data) => Some(data),
            Self::Written(_) => None,
        }
    }

    /// Consume into the converted content, if returned in memory.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(data) => Some(data),
            Self::Written(_) => None,
        }
    }
}
