use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use grabber_logging::grab_info;
use tempfile::NamedTempFile;
use thiserror::Error;
use zip::write::FileOptions;
use zip::CompressionMethod;

use crate::session::RunLayout;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub files: usize,
}

/// Zip the run directory into its sibling `<run>.zip`.
pub fn archive_run(layout: &RunLayout) -> Result<ArchiveSummary, ArchiveError> {
    let summary = zip_directory(&layout.root(), &layout.archive_path())?;
    grab_info!("Archived {} files into {}", summary.files, summary.path.display());
    Ok(summary)
}

/// Write every file and directory under `src` into `dest`, with entry names
/// rooted at `src`'s own name (`<run>/stickers/sticker_0001.gif`). The
/// archive is assembled in a temporary file and renamed into place.
pub fn zip_directory(src: &Path, dest: &Path) -> Result<ArchiveSummary, ArchiveError> {
    if !src.is_dir() {
        return Err(ArchiveError::NotADirectory(src.to_path_buf()));
    }
    let root_name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| ArchiveError::NotADirectory(src.to_path_buf()))?;
    let dest_dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut entries = Vec::new();
    collect_entries(src, &mut entries)?;
    entries.sort();

    let tmp = NamedTempFile::new_in(dest_dir)?;
    let mut zip = zip::ZipWriter::new(tmp);
    let file_options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    // Directories need the search bit or the extracted tree cannot be entered.
    let dir_options = FileOptions::default().unix_permissions(0o755);

    zip.add_directory(format!("{root_name}/"), dir_options)?;
    let mut files = 0;
    for path in entries {
        let relative = path.strip_prefix(src).unwrap_or(&path);
        let name = format!("{root_name}/{}", entry_name(relative));
        if path.is_dir() {
            zip.add_directory(format!("{name}/"), dir_options)?;
        } else {
            zip.start_file(name, file_options)?;
            let mut file = File::open(&path)?;
            io::copy(&mut file, &mut zip)?;
            files += 1;
        }
    }

    let tmp = zip.finish()?;
    tmp.persist(dest).map_err(|e| ArchiveError::Io(e.error))?;
    Ok(ArchiveSummary {
        path: dest.to_path_buf(),
        files,
    })
}

fn collect_entries(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            out.push(path.clone());
            collect_entries(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Zip entry names always use `/`, whatever the host separator.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
