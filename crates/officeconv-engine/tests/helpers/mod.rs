//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use officeconv_core::config::conversion::ConversionConfig;
use officeconv_engine::bridge::BridgeAddress;
use officeconv_engine::bridge::mock::MockOfficeEngine;
use officeconv_engine::{ConversionOrchestrator, RemoteOfficeSession};
use tempfile::TempDir;

/// Test conversion context backed by the in-memory engine.
pub struct TestConverter {
    /// The mock engine, for inspecting call counters.
    pub engine: MockOfficeEngine,
    /// The orchestrator under test.
    pub orchestrator: ConversionOrchestrator,
    /// Scratch directory used as temp root.
    pub temp: TempDir,
    /// Directory for caller-owned input and output files.
    pub files: TempDir,
}

impl TestConverter {
    /// Create a converter over the default mock catalog.
    pub fn new() -> Self {
        Self::with_engine(MockOfficeEngine::new())
    }

    /// Create a converter over a prepared engine.
    pub fn with_engine(engine: MockOfficeEngine) -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp root");
        let files = tempfile::tempdir().expect("Failed to create file dir");

        let session = RemoteOfficeSession::connect(&engine, BridgeAddress::default())
            .expect("Failed to connect to mock engine");
        let config = ConversionConfig {
            temp_root: Some(temp.path().to_path_buf()),
            ..Default::default()
        };

        Self {
            orchestrator: ConversionOrchestrator::with_config(session, &config),
            engine,
            temp,
            files,
        }
    }

    /// Write a caller-owned file and return its path.
    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.files.path().join(name);
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Path for a caller-owned file that does not exist yet.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.files.path().join(name)
    }

    /// Number of entries left in the temp root.
    pub fn temp_entries(&self) -> usize {
        count_entries(self.temp.path())
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}
