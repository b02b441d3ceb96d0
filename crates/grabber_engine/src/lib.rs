//! Grabber engine: page driving, the scan loop, downloads and run output.
mod access;
mod archive;
mod chromium;
mod dispatch;
mod driver;
mod fetch;
mod ingest;
mod persist;
mod scan;
mod selectors;
mod session;
mod types;

pub use access::{ensure_access, AccessError, LoginPrompt, NonInteractive};
pub use archive::{archive_run, zip_directory, ArchiveError, ArchiveSummary};
pub use chromium::{BrowserSettings, ChromiumDriver, ChromiumSession};
pub use dispatch::fetch_all;
pub use driver::{DriverError, Locator, PageDriver, ScrollTarget};
pub use fetch::{
    AssetFetcher, FetchSettings, NullProgressSink, ProgressSink, ReqwestFetcher, DEFAULT_USER_AGENT,
};
pub use ingest::{ingest_local, IngestError, LocalSource};
pub use persist::{ensure_output_dir, write_comments, AtomicFileWriter, PersistError, COMMENTS_FILENAME};
pub use scan::{scan_target, ScanSettings};
pub use selectors::{AccessSelectors, SelectorSet, EXTRACTION_SCRIPT, MAX_AUTHOR_DEPTH};
pub use session::{
    run_timestamp, sanitize_component, ContentCategory, OutputFeatures, RunLayout, SessionError,
    SessionLock, LOCK_FILENAME,
};
pub use types::{
    DownloadedAsset, EngineEvent, FailureKind, FetchError, FetchResult, ScanProgress, ScanReport,
    StopReason,
};
