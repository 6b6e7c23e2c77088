//! Scoped filesystem locations for conversion input and output.
//!
//! A caller either owns a path (it is used as-is and never touched) or
//! hands over bytes, in which case a temporary file holds them for as long
//! as the [`TempResource`] lives and is removed when it drops.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::debug;

/// A usable path for the duration of one conversion.
#[derive(Debug)]
pub enum TempResource {
    /// Caller-owned path.
    Provided(PathBuf),
    /// Temporary file, deleted on drop.
    Temporary(TempPath),
}

impl TempResource {
    /// Yield `path` if given, otherwise a fresh temp file in `dir`.
    ///
    /// The temp file name ends with `suffix` (include the dot, or pass `""`)
    /// and contains `data` if any, flushed before this returns.
    pub fn acquire(
        path: Option<&Path>,
        dir: &Path,
        suffix: &str,
        data: Option<&[u8]>,
    ) -> std::io::Result<Self> {
        if let Some(path) = path.filter(|p| !p.as_os_str().is_empty()) {
            return Ok(Self::Provided(path.to_path_buf()));
        }

        let mut file = tempfile::Builder::new()
            .prefix("officeconv-")
            .suffix(suffix)
            .tempfile_in(dir)?;

        if let Some(data) = data.filter(|d| !d.is_empty()) {
            file.write_all(data)?;
            file.flush()?;
        }

        let temp_path = file.into_temp_path();
        debug!(path = %temp_path.display(), "Created temporary file");
        Ok(Self::Temporary(temp_path))
    }

    /// The usable path.
    pub fn path(&self) -> &Path {
        match self {
            Self::Provided(path) => path.as_path(),
            Self::Temporary(temp) => &**temp,
        }
    }

    /// Whether the path is a temporary file owned by this resource.
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }
}

impl AsRef<Path> for TempResource {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provided_path_is_untouched() {
        let dir = tempfile::tempdir().expect("tempdir");
        let owned = dir.path().join("report.odt");
        std::fs::write(&owned, b"keep me").expect("write");

        {
            let resource =
                TempResource::acquire(Some(&owned), dir.path(), ".pdf", Some(b"ignored"))
                    .expect("acquire");
            assert_eq!(resource.path(), owned);
            assert!(!resource.is_temporary());
        }

        assert_eq!(std::fs::read(&owned).expect("read"), b"keep me");
    }

    #[test]
    fn test_temporary_file_holds_data_and_is_removed() {
        let dir = tempfile::tempdir().expect("tempdir");

        let path = {
            let resource = TempResource::acquire(None, dir.path(), "", Some(b"hello"))
                .expect("acquire");
            assert!(resource.is_temporary());
            assert_eq!(std::fs::read(resource.path()).expect("read"), b"hello");
            resource.path().to_path_buf()
        };

        assert!(!path.exists());
    }

    #[test]
    fn test_temporary_file_carries_suffix() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resource = TempResource::acquire(None, dir.path(), ".pdf", None).expect("acquire");

        assert_eq!(
            resource.path().extension().and_then(|e| e.to_str()),
            Some("pdf")
        );
        assert_eq!(std::fs::metadata(resource.path()).expect("meta").len(), 0);
    }

    #[test]
    fn test_empty_path_means_temporary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let empty = PathBuf::new();
        let resource =
            TempResource::acquire(Some(&empty), dir.path(), ".odt", None).expect("acquire");
        assert!(resource.is_temporary());
    }
}
