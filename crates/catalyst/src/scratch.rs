//! scoped scratch directories
//!
//! A [TempDirBuilder] only describes where a directory should go. Nothing touches the
//! filesystem until [TempDirBuilder::enter] is called. The returned [ScratchDir] removes
//! the directory when it goes out of scope, unless cleanup was turned off.
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct TempDirBuilder {
    base_path: PathBuf,
    cleanup: bool,
}

impl Default for TempDirBuilder {
    fn default() -> Self {
        Self {
            base_path: std::env::temp_dir(),
            cleanup: true,
        }
    }
}

impl TempDirBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Keep the directory around after the [ScratchDir] is dropped
    pub fn cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    pub fn get_base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn enter(&self) -> std::io::Result<ScratchDir> {
        let dir = tempfile::Builder::new()
            .prefix("catalyst-")
            .tempdir_in(&self.base_path)?;
        tracing::debug!(path=%dir.path().display(), cleanup = self.cleanup, "scratch dir created");

        if self.cleanup {
            let path = dir.path().to_owned();
            Ok(ScratchDir {
                path,
                dir: Some(dir),
            })
        } else {
            Ok(ScratchDir {
                path: dir.keep(),
                dir: None,
            })
        }
    }
}

#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    /// `None` when the directory outlives this value
    dir: Option<tempfile::TempDir>,
}

impl ScratchDir {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory now and report failures, which dropping would swallow
    pub fn close(mut self) -> std::io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug)]
    struct SomeError;

    fn fails_inside(builder: &TempDirBuilder) -> Result<PathBuf, (PathBuf, SomeError)> {
        let dir = builder.enter().unwrap();
        assert!(dir.path().is_dir());
        Err((dir.path().to_owned(), SomeError))
    }

    #[test]
    fn builder_does_not_touch_filesystem() {
        let base = tempfile::tempdir().unwrap();
        let builder = TempDirBuilder::new().base_path(base.path());

        assert_eq!(builder.get_base_path(), base.path());
        assert_eq!(std::fs::read_dir(base.path()).unwrap().count(), 0);
    }

    #[test]
    fn removed_on_drop() {
        let base = tempfile::tempdir().unwrap();
        let builder = TempDirBuilder::new().base_path(base.path());

        let path = {
            let dir = builder.enter().unwrap();
            assert!(dir.path().is_dir());
            assert!(dir.path().starts_with(base.path()));
            dir.path().to_owned()
        };
        assert!(!path.exists());

        let (path, _) = fails_inside(&builder).unwrap_err();
        assert!(!path.exists(), "removed on the error path as well");
    }

    #[test]
    fn kept_without_cleanup() {
        let base = tempfile::tempdir().unwrap();
        let builder = TempDirBuilder::new().base_path(base.path()).cleanup(false);

        let path = {
            let dir = builder.enter().unwrap();
            dir.path().to_owned()
        };
        assert!(path.is_dir());
        assert!(path.starts_with(base.path()));
    }

    #[test]
    fn close() {
        let dir = TempDirBuilder::new().enter().unwrap();
        let path = dir.path().to_owned();
        assert!(path.starts_with(std::env::temp_dir()));

        dir.close().unwrap();
        assert!(!path.exists());
    }
}
