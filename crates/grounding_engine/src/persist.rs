use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use engine_logging::engine_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::cache_filename;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cache directory missing or not writable: {0}")]
    CacheDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the cache directory exists; create if missing.
pub fn ensure_cache_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::CacheDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::CacheDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::CacheDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write bytes to `{dir}/{filename}` by writing a temp file then renaming.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_cache_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // A reader holding the old file keeps its copy until it reopens.
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Local copies of document bytes handed to the page renderer.
#[derive(Debug, Clone)]
pub struct DocumentCache {
    writer: AtomicFileWriter,
}

impl DocumentCache {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    pub fn path_for(&self, doc_id: &str) -> PathBuf {
        self.writer.dir().join(cache_filename(doc_id))
    }

    pub fn store(&self, doc_id: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let path = self.writer.write(&cache_filename(doc_id), bytes)?;
        engine_debug!("cached {} bytes for {} at {}", bytes.len(), doc_id, path.display());
        Ok(path)
    }

    /// Drop the cached copy; a missing file is not an error.
    pub fn remove(&self, doc_id: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path_for(doc_id)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
