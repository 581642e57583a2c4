// src/core/harness/workspace.rs

use crate::core::error::HarnessError;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default name of the scratch directory, relative to where the harness runs.
pub const DEFAULT_WORKDIR: &str = "test-env";

/// The file-system operations the harness performs on its workspace.
///
/// Fixtures and reports are written through this trait so that runs can be
/// exercised in memory.
pub trait FileSink {
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Writes `contents` to `path`, replacing any existing file.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Writes straight to the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskSink;

impl FileSink for DiskSink {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// The scratch directory a single run owns.
///
/// Fixture writes and tool invocations are resolved against `root` instead of
/// the process's current directory, which is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Creates the scratch directory if it is absent.
    pub fn prepare(sink: &impl FileSink, root: impl Into<PathBuf>) -> Result<Self, HarnessError> {
        let root = root.into();
        debug!(path = %root.display(), "Preparing workspace.");
        sink.create_dir_all(&root)
            .map_err(|source| HarnessError::Workspace {
                path: root.clone(),
                source,
            })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a workspace-relative path.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::FileSink;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};
    use std::io;
    use std::path::{Path, PathBuf};

    /// In-memory sink for tests. Paths listed in `read_only` reject writes.
    #[derive(Debug, Default)]
    pub struct MemorySink {
        pub dirs: RefCell<BTreeSet<PathBuf>>,
        pub files: RefCell<BTreeMap<PathBuf, Vec<u8>>>,
        pub read_only: BTreeSet<PathBuf>,
        pub writes: RefCell<usize>,
    }

    impl MemorySink {
        pub fn rejecting(path: impl Into<PathBuf>) -> Self {
            let mut sink = Self::default();
            sink.read_only.insert(path.into());
            sink
        }

        pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
            self.files
                .borrow()
                .get(path.as_ref())
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        }
    }

    impl FileSink for MemorySink {
        fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            if self.read_only.contains(path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            self.dirs.borrow_mut().insert(path.to_path_buf());
            Ok(())
        }

        fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            if self.read_only.contains(path) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
            }
            *self.writes.borrow_mut() += 1;
            self.files.borrow_mut().insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemorySink;
    use super::*;

    #[test]
    fn prepare_creates_the_root() {
        let sink = MemorySink::default();
        let workspace = Workspace::prepare(&sink, "test-env").unwrap();
        assert!(sink.dirs.borrow().contains(Path::new("test-env")));
        assert_eq!(workspace.join("Dockerfile"), PathBuf::from("test-env/Dockerfile"));
    }

    #[test]
    fn prepare_surfaces_io_errors() {
        let sink = MemorySink::rejecting("locked");
        let err = Workspace::prepare(&sink, "locked").unwrap_err();
        assert!(matches!(err, HarnessError::Workspace { .. }));
    }

    #[test]
    fn disk_sink_creates_nested_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("a").join("test-env");
        let workspace = Workspace::prepare(&DiskSink, &root).unwrap();
        assert!(workspace.root().is_dir());
    }
}
