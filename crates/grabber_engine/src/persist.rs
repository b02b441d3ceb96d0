use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use grabber_core::CommentRecord;
use tempfile::NamedTempFile;
use thiserror::Error;

pub const COMMENTS_FILENAME: &str = "comments.json";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Write `comments.json` (pretty, UTF-8) into `dir`. Nothing is written for
/// an empty list.
pub fn write_comments(dir: &Path, comments: &[CommentRecord]) -> Result<Option<PathBuf>, PersistError> {
    if comments.is_empty() {
        return Ok(None);
    }
    let mut json = serde_json::to_string_pretty(comments)?;
    json.push('\n');
    let path = AtomicFileWriter::new(dir.to_path_buf()).write(COMMENTS_FILENAME, json.as_bytes())?;
    Ok(Some(path))
}
