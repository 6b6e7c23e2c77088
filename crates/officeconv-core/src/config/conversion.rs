//! Configuration for the conversion pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings applied to every conversion request.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Allow refreshing document indexes (tables of contents) before export.
    ///
    /// When false, index refresh is skipped even if a request asks for it.
    pub update_index: bool,

    /// Number of engine sessions the service keeps open.
    ///
    /// One engine connection handles one foreground document at a time, so
    /// this is also the conversion concurrency limit.
    #[validate(range(min = 1, max = 16))]
    pub max_sessions: usize,

    /// Directory for temporary input/output files.
    pub temp_root: Option<PathBuf>,

    /// Minimum output size (bytes) to consider a conversion successful.
    ///
    /// Zero disables the check.
    pub min_output_bytes: u64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            update_index: true,
            max_sessions: default_max_sessions(),
            temp_root: None,
            min_output_bytes: 0,
        }
    }
}

fn default_max_sessions() -> usize {
    1
}

impl ConversionConfig {
    /// Resolve the effective temp root directory.
    pub fn effective_temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }
}
