use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use grabber_core::sticker_filename;
use grabber_logging::{grab_debug, grab_info};
use thiserror::Error;

use crate::session::sanitize_component;

const STICKER_EXTENSIONS: &[&str] = &["gif", "webp", "mp4"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0} is neither a directory nor a zip archive")]
    Unsupported(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// An existing local path given in place of a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalSource {
    Directory(PathBuf),
    Zip(PathBuf),
}

impl LocalSource {
    /// Classify `input` if it names something on disk. `Ok(None)` means the
    /// input is not a local path at all and should be treated as a URL.
    pub fn detect(input: &str) -> Result<Option<Self>, IngestError> {
        let path = Path::new(input.trim());
        if input.trim().is_empty() || !path.exists() {
            return Ok(None);
        }
        if path.is_dir() {
            return Ok(Some(LocalSource::Directory(path.to_path_buf())));
        }
        if has_extension(path, &["zip"]) {
            return Ok(Some(LocalSource::Zip(path.to_path_buf())));
        }
        Err(IngestError::Unsupported(path.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        match self {
            LocalSource::Directory(p) | LocalSource::Zip(p) => p,
        }
    }

    /// Run identifier derived from the directory or archive name.
    pub fn run_id(&self) -> String {
        let stem = self
            .path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        sanitize_component(&stem)
    }
}

/// Copy every sticker-like file from `source` into `stickers_dir` as
/// `sticker_NNNN.<ext>`, ordered by source path. Returns the written paths.
pub fn ingest_local(source: &LocalSource, stickers_dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    fs::create_dir_all(stickers_dir)?;
    let written = match source {
        LocalSource::Directory(dir) => ingest_directory(dir, stickers_dir)?,
        LocalSource::Zip(path) => ingest_zip(path, stickers_dir)?,
    };
    grab_info!("Collected {} local stickers from {}", written.len(), source.path().display());
    Ok(written)
}

fn ingest_directory(dir: &Path, stickers_dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();
    collect_sticker_files(dir, stickers_dir, &mut files)?;
    files.sort();

    let mut written = Vec::with_capacity(files.len());
    for (offset, src) in files.iter().enumerate() {
        let dest = stickers_dir.join(sticker_filename(offset + 1, &dotted_extension(src)));
        fs::copy(src, &dest)?;
        grab_debug!("Copied {} -> {}", src.display(), dest.display());
        written.push(dest);
    }
    Ok(written)
}

fn collect_sticker_files(dir: &Path, skip: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if path != skip {
                collect_sticker_files(&path, skip, out)?;
            }
        } else if has_extension(&path, STICKER_EXTENSIONS) {
            out.push(path);
        }
    }
    Ok(())
}

fn ingest_zip(path: &Path, stickers_dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;

    let mut names: Vec<(String, usize)> = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let Some(name) = entry.enclosed_name().map(Path::to_path_buf) else {
            continue;
        };
        if has_extension(&name, STICKER_EXTENSIONS) {
            names.push((name.to_string_lossy().into_owned(), index));
        }
    }
    names.sort();

    let mut written = Vec::with_capacity(names.len());
    for (offset, (name, index)) in names.iter().enumerate() {
        let mut entry = archive.by_index(*index)?;
        let dest = stickers_dir.join(sticker_filename(offset + 1, &dotted_extension(Path::new(name))));
        let mut out = File::create(&dest)?;
        io::copy(&mut entry, &mut out)?;
        written.push(dest);
    }
    Ok(written)
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| allowed.iter().any(|a| a.eq_ignore_ascii_case(e)))
}

fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_else(|| ".gif".to_string())
}
