//! Mixin output channel: one file per produced value.

use crate::error::{Result, RuntimeError};
use crate::manifest::ProducedOutputs;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory a running mixin writes its outputs into.
///
/// File names are output names and contents are raw values. The runtime is
/// the only reader and removes every file it reads, so nothing carries over
/// to the next step.
#[derive(Debug, Clone)]
pub struct OutputChannel {
    dir: PathBuf,
}

impl OutputChannel {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the channel directory if it does not exist.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| RuntimeError::OutputDirectory {
            path: self.dir.clone(),
            message: e.to_string(),
        })
    }

    /// Read and remove every file in the channel.
    ///
    /// Subdirectories are ignored. The first unreadable or undeletable file
    /// fails the whole read and nothing read so far is returned.
    pub fn drain(&self) -> Result<ProducedOutputs> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            RuntimeError::OutputRead(format!("could not list '{}': {}", self.dir.display(), e))
        })?;

        let mut outputs = ProducedOutputs::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                RuntimeError::OutputRead(format!("could not list '{}': {}", self.dir.display(), e))
            })?;
            let path = entry.path();

            let file_type = entry.file_type().map_err(|e| {
                RuntimeError::OutputRead(format!(
                    "could not inspect output file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            if file_type.is_dir() {
                continue;
            }

            let name = entry.file_name().into_string().map_err(|raw| {
                RuntimeError::OutputRead(format!(
                    "output file name '{}' is not valid UTF-8",
                    raw.to_string_lossy()
                ))
            })?;

            let contents = fs::read(&path).map_err(|e| {
                RuntimeError::OutputRead(format!(
                    "could not read output file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            fs::remove_file(&path).map_err(|e| {
                RuntimeError::OutputRead(format!(
                    "could not remove output file '{}': {}",
                    path.display(),
                    e
                ))
            })?;

            outputs.insert(name, contents);
        }

        debug!(count = outputs.len(), "drained mixin outputs");
        Ok(outputs)
    }
}
