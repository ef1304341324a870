//! Destinations for exported files.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Output rejected: {0}")]
    Rejected(String),
}

/// Receives a named file produced by export.
pub trait OutputSink {
    fn save(&mut self, name: &str, bytes: &[u8]) -> Result<(), SinkError>;
}

/// Writes files into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl OutputSink for FileSink {
    fn save(&mut self, name: &str, bytes: &[u8]) -> Result<(), SinkError> {
        let path = self.dir.join(name);
        let io_err = |source: io::Error| SinkError::Io {
            path: path.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        fs::write(&path, bytes).map_err(io_err)?;
        log::info!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Keeps saved files in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of the most recent file saved under `name`.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| bytes.as_slice())
    }
}

impl OutputSink for MemorySink {
    fn save(&mut self, name: &str, bytes: &[u8]) -> Result<(), SinkError> {
        self.files.push((name.to_string(), bytes.to_vec()));
        Ok(())
    }
}
