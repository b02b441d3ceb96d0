use std::fmt;
use std::path::PathBuf;

use grabber_core::ScanOutcome;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// One scan round finished.
    ScanRound(ScanProgress),
    /// One download finished, successfully or not. Emitted in completion order.
    FetchProgress {
        completed: usize,
        total: usize,
        succeeded: usize,
        result: FetchResult,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    pub round: u32,
    pub stickers: usize,
    pub comments: usize,
    pub stagnant_rounds: u32,
    pub container: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Ran every configured round.
    RoundLimit,
    /// Stagnated with no load-more control visible.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub rounds: u32,
    pub stop: StopReason,
}

/// Per-item download result. A batch is never collapsed into one error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub source_url: String,
    pub local_path: Option<PathBuf>,
    pub error: Option<FetchError>,
}

impl FetchResult {
    pub fn saved(source_url: impl Into<String>, local_path: PathBuf) -> Self {
        Self {
            source_url: source_url.into(),
            local_path: Some(local_path),
            error: None,
        }
    }

    pub fn failed(source_url: impl Into<String>, error: FetchError) -> Self {
        Self {
            source_url: source_url.into(),
            local_path: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.local_path.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedAsset {
    pub path: PathBuf,
    pub final_url: String,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Io,
    Network,
    /// The download task panicked.
    Panicked,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Panicked => write!(f, "download task panicked"),
        }
    }
}
