//! Bundle output store: one file per finalized bundle output.

use crate::error::{Result, RuntimeError};
use crate::fs::{atomic_write, copy_file};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding finalized bundle outputs, keyed by declared name.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Whether an output with this name has already been written.
    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| RuntimeError::OutputDirectory {
            path: self.dir.clone(),
            message: e.to_string(),
        })
    }

    /// Write `value` unchanged as the content of output `name`.
    pub fn write(&self, name: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(name);
        atomic_write(&path, value).map_err(|e| RuntimeError::OutputBind {
            name: name.to_string(),
            path,
            message: e.to_string(),
        })
    }

    /// Copy `source` verbatim into output `name`.
    pub fn copy_from(&self, name: &str, source: &Path) -> Result<()> {
        let path = self.path_for(name);
        copy_file(source, &path).map_err(|e| RuntimeError::UnboundOutputCopy {
            name: name.to_string(),
            from: source.to_path_buf(),
            to: path,
            message: e.to_string(),
        })
    }
}
