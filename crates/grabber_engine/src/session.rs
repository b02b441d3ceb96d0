use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use grabber_logging::grab_warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persist::{ensure_output_dir, PersistError};

pub const LOCK_FILENAME: &str = ".grabber.lock";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser session {0} is already in use by another run")]
    SessionBusy(PathBuf),
    #[error("run directory {0} already exists")]
    RunExists(PathBuf),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    Media,
    Stickers,
    Converted,
    Stories,
    Highlights,
}

impl ContentCategory {
    pub fn dir_name(self) -> &'static str {
        match self {
            ContentCategory::Media => "media",
            ContentCategory::Stickers => "stickers",
            ContentCategory::Converted => "converted",
            ContentCategory::Stories => "stories",
            ContentCategory::Highlights => "highlights",
        }
    }
}

/// Which per-category subdirectories a run may create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFeatures {
    pub media: bool,
    pub stickers: bool,
    pub converted: bool,
    pub stories: bool,
    pub highlights: bool,
}

impl Default for OutputFeatures {
    fn default() -> Self {
        Self {
            media: false,
            stickers: true,
            converted: false,
            stories: false,
            highlights: false,
        }
    }
}

impl OutputFeatures {
    pub fn enabled(&self, category: ContentCategory) -> bool {
        match category {
            ContentCategory::Media => self.media,
            ContentCategory::Stickers => self.stickers,
            ContentCategory::Converted => self.converted,
            ContentCategory::Stories => self.stories,
            ContentCategory::Highlights => self.highlights,
        }
    }
}

/// `<base>/<id>_<timestamp>/` plus its sibling archive path.
#[derive(Debug, Clone)]
pub struct RunLayout {
    base: PathBuf,
    run_name: String,
    features: OutputFeatures,
}

impl RunLayout {
    /// Create the run directory. Category subdirectories are created later,
    /// on first use, and only for enabled categories.
    pub fn create(
        base: &Path,
        target_id: &str,
        timestamp: &str,
        features: OutputFeatures,
    ) -> Result<Self, SessionError> {
        ensure_output_dir(base)?;
        let run_name = format!("{}_{timestamp}", sanitize_component(target_id));
        let layout = Self {
            base: base.to_path_buf(),
            run_name,
            features,
        };
        let root = layout.root();
        if root.exists() {
            return Err(SessionError::RunExists(root));
        }
        fs::create_dir(&root)?;
        Ok(layout)
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn root(&self) -> PathBuf {
        self.base.join(&self.run_name)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.base.join(format!("{}.zip", self.run_name))
    }

    /// Directory for `category`, created on demand. `None` when the category
    /// is disabled.
    pub fn category_dir(&self, category: ContentCategory) -> Result<Option<PathBuf>, SessionError> {
        if !self.features.enabled(category) {
            return Ok(None);
        }
        let dir = self.root().join(category.dir_name());
        fs::create_dir_all(&dir)?;
        Ok(Some(dir))
    }
}

/// `YYYYMMDD_HHMMSS` stamp used in run directory names.
pub fn run_timestamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("%Y%m%d_%H%M%S").to_string()
}

/// Exclusive claim on a browser profile directory for the lifetime of a run.
///
/// A second run against the same directory fails with
/// [`SessionError::SessionBusy`]. The lock file is removed on drop.
#[derive(Debug)]
pub struct SessionLock {
    path: PathBuf,
}

impl SessionLock {
    pub fn acquire(session_dir: &Path) -> Result<Self, SessionError> {
        fs::create_dir_all(session_dir)?;
        let path = session_dir.join(LOCK_FILENAME);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(SessionError::SessionBusy(session_dir.to_path_buf()));
            }
            Err(err) => return Err(err.into()),
        };
        writeln!(file, "{}", std::process::id())?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            grab_warn!("Could not release session lock {:?}: {}", self.path, err);
        }
    }
}

/// Make `input` safe as a single path component on every platform.
pub fn sanitize_component(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "untitled".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    let mut final_name: String = compacted.chars().take(80).collect();
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_separators_and_reserved_names() {
        assert_eq!(sanitize_component("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_component("..."), "untitled");
        assert_eq!(sanitize_component("con"), "con_");
        assert_eq!(sanitize_component("my stickers.zip"), "my stickers.zip");
    }

    #[test]
    fn timestamp_format_is_compact() {
        let now = chrono::Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(run_timestamp(&now), "20240309_070501");
    }
}
