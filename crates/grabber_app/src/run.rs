use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use grabber_core::{identify_target, InputError, Target};
use grabber_engine::{
    archive_run, ensure_access, fetch_all, ingest_local, run_timestamp, scan_target,
    write_comments, AccessError, ArchiveError, AssetFetcher, ChromiumSession, ContentCategory,
    DriverError, EngineEvent, FetchError, IngestError, LocalSource, LoginPrompt, NonInteractive,
    PersistError, ProgressSink, ReqwestFetcher, RunLayout, ScanReport, SessionError, SessionLock,
    StopReason,
};
use grabber_logging::{grab_debug, grab_info, grab_warn};
use thiserror::Error;

use crate::config::GrabberConfig;
use crate::prompt::StdinPrompt;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("browser error: {0}")]
    Browser(#[from] DriverError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("could not set up downloads: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("archive failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("local import failed: {0}")]
    Ingest(#[from] IngestError),
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub target_id: String,
    pub run_dir: PathBuf,
    pub archive: Option<PathBuf>,
    pub stickers_found: usize,
    pub stickers_saved: usize,
    pub comments_saved: usize,
    /// Rounds scanned and why the scan ended; `None` for local imports.
    pub scan: Option<(u32, StopReason)>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Target: {}", self.target_id)?;
        if let Some((rounds, stop)) = self.scan {
            let why = match stop {
                StopReason::RoundLimit => "round limit reached",
                StopReason::Exhausted => "no more content",
            };
            writeln!(f, "Scan: {rounds} rounds ({why})")?;
        }
        writeln!(
            f,
            "Stickers: {} of {} succeeded",
            self.stickers_saved, self.stickers_found
        )?;
        writeln!(f, "Comments: {}", self.comments_saved)?;
        write!(f, "Output: {}", self.run_dir.display())?;
        if let Some(archive) = &self.archive {
            write!(f, "\nArchive: {}", archive.display())?;
        }
        Ok(())
    }
}

/// Logs scan rounds and download completions as they happen.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: EngineEvent) {
        match event {
            EngineEvent::ScanRound(progress) => grab_info!(
                "Round {}: {} stickers, {} comments, {} flat rounds, container {:?}",
                progress.round + 1,
                progress.stickers,
                progress.comments,
                progress.stagnant_rounds,
                progress.container
            ),
            EngineEvent::FetchProgress {
                completed,
                total,
                succeeded,
                result,
            } => match &result.error {
                None => grab_debug!("[{}/{}] saved {}", completed, total, result.source_url),
                Some(err) => grab_warn!(
                    "[{}/{}] failed {}: {} ({} ok so far)",
                    completed,
                    total,
                    result.source_url,
                    err,
                    succeeded
                ),
            },
        }
    }
}

/// Run the whole pipeline for one input: a local directory or zip when
/// the path exists, otherwise a post or profile URL.
pub async fn run(
    input: &str,
    config: &GrabberConfig,
    sink: &dyn ProgressSink,
) -> Result<RunSummary, RunError> {
    let timestamp = run_timestamp(&Local::now());
    match LocalSource::detect(input) {
        Ok(Some(source)) => return run_local(&source, config, &timestamp),
        Ok(None) => {}
        Err(IngestError::Unsupported(path)) => {
            return Err(InputError::UnrecognizedInput(path.display().to_string()).into());
        }
        Err(err) => return Err(err.into()),
    }

    let target = identify_target(input)?;
    grab_info!("Target {} {} -> {}", target.kind(), target.id(), target.canonical_url());
    let report = scan_in_browser(&target, config, sink).await?;
    grab_info!(
        "Scan finished after {} rounds: {} stickers, {} comments",
        report.rounds,
        report.outcome.stickers.len(),
        report.outcome.comments.len()
    );

    let layout = RunLayout::create(
        &config.output.base_dir,
        target.id(),
        &timestamp,
        config.output.features,
    )?;
    let stickers_dir = stickers_dir(&layout)?;

    let fetch_settings = config.fetch.to_settings();
    let fetcher: Arc<dyn AssetFetcher> = Arc::new(ReqwestFetcher::new(&fetch_settings)?);
    let items: Vec<String> = report.outcome.stickers.into_iter().collect();
    let stickers_found = items.len();
    let results = fetch_all(fetcher, items, &stickers_dir, fetch_settings.workers, sink).await;
    let stickers_saved = results.iter().filter(|r| r.is_success()).count();

    let comments_saved = match write_comments(&layout.root(), &report.outcome.comments)? {
        Some(path) => {
            grab_info!("Wrote {} comments to {}", report.outcome.comments.len(), path.display());
            report.outcome.comments.len()
        }
        None => 0,
    };

    Ok(RunSummary {
        target_id: target.id().to_string(),
        run_dir: layout.root(),
        archive: finish_archive(&layout, config)?,
        stickers_found,
        stickers_saved,
        comments_saved,
        scan: Some((report.rounds, report.stop)),
    })
}

fn run_local(
    source: &LocalSource,
    config: &GrabberConfig,
    timestamp: &str,
) -> Result<RunSummary, RunError> {
    let run_id = source.run_id();
    grab_info!("Importing stickers from {}", source.path().display());
    let layout = RunLayout::create(&config.output.base_dir, &run_id, timestamp, config.output.features)?;
    let written = ingest_local(source, &stickers_dir(&layout)?)?;

    Ok(RunSummary {
        target_id: run_id,
        run_dir: layout.root(),
        archive: finish_archive(&layout, config)?,
        stickers_found: written.len(),
        stickers_saved: written.len(),
        comments_saved: 0,
        scan: None,
    })
}

/// Launch the browser, clear the access gate and scan. The browser is
/// closed whatever the outcome.
async fn scan_in_browser(
    target: &Target,
    config: &GrabberConfig,
    sink: &dyn ProgressSink,
) -> Result<ScanReport, RunError> {
    let browser_settings = config.browser.to_settings(&config.fetch.user_agent);
    let lock = SessionLock::acquire(&browser_settings.profile_dir)?;
    let session = ChromiumSession::launch(&browser_settings, lock).await?;

    let outcome = scan_with_session(&session, target, config, sink).await;
    session.close().await;
    outcome
}

async fn scan_with_session(
    session: &ChromiumSession,
    target: &Target,
    config: &GrabberConfig,
    sink: &dyn ProgressSink,
) -> Result<ScanReport, RunError> {
    let mut driver = session.open_driver().await?;
    let prompt: &dyn LoginPrompt = if config.interactive {
        &StdinPrompt
    } else {
        &NonInteractive
    };
    let scan_settings = config.scan.to_settings();
    ensure_access(
        &mut driver,
        target,
        &scan_settings.selectors.access,
        config.scan.access_settle(),
        prompt,
    )
    .await?;
    Ok(scan_target(&mut driver, target, &scan_settings, sink).await)
}

/// Stickers land in `stickers/` even when the category flag is off, since
/// they are what every run collects.
fn stickers_dir(layout: &RunLayout) -> Result<PathBuf, RunError> {
    match layout.category_dir(ContentCategory::Stickers)? {
        Some(dir) => Ok(dir),
        None => {
            let dir = layout.root().join(ContentCategory::Stickers.dir_name());
            std::fs::create_dir_all(&dir).map_err(SessionError::from)?;
            Ok(dir)
        }
    }
}

fn finish_archive(layout: &RunLayout, config: &GrabberConfig) -> Result<Option<PathBuf>, RunError> {
    if !config.output.archive {
        return Ok(None);
    }
    Ok(Some(archive_run(layout)?.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grabber_engine::NullProgressSink;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn config_in(base: &Path) -> GrabberConfig {
        let mut config = GrabberConfig::default();
        config.output.base_dir = base.to_path_buf();
        config.log_file = None;
        config.interactive = false;
        config
    }

    #[tokio::test]
    async fn local_directory_is_imported_and_archived() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("saved_pack");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("one.gif"), b"1").unwrap();
        fs::write(source.join("two.webp"), b"2").unwrap();
        let base = temp.path().join("out");

        let summary = run(source.to_str().unwrap(), &config_in(&base), &NullProgressSink)
            .await
            .unwrap();

        assert_eq!(summary.target_id, "saved_pack");
        assert_eq!(summary.stickers_found, 2);
        assert_eq!(summary.stickers_saved, 2);
        assert_eq!(summary.scan, None);
        assert!(summary.run_dir.join("stickers").join("sticker_0002.webp").is_file());
        let archive = summary.archive.unwrap();
        assert!(archive.is_file());
        assert_eq!(archive.parent(), Some(base.as_path()));
    }

    #[tokio::test]
    async fn existing_plain_file_is_unrecognized() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("notes.txt");
        fs::write(&file, b"x").unwrap();

        let err = run(file.to_str().unwrap(), &config_in(temp.path()), &NullProgressSink)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Input(InputError::UnrecognizedInput(_))));
    }

    #[tokio::test]
    async fn garbage_input_fails_before_any_browser_work() {
        let temp = TempDir::new().unwrap();
        let err = run("not a url", &config_in(temp.path()), &NullProgressSink)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Input(_)));
        assert!(fs::read_dir(temp.path()).unwrap().next().is_none());
    }

    #[test]
    fn summary_reports_success_ratio() {
        let summary = RunSummary {
            target_id: "ABC123".to_string(),
            run_dir: PathBuf::from("downloads/ABC123_20240309_070501"),
            archive: None,
            stickers_found: 12,
            stickers_saved: 11,
            comments_saved: 4,
            scan: Some((9, StopReason::Exhausted)),
        };
        let text = summary.to_string();
        assert!(text.contains("Stickers: 11 of 12 succeeded"));
        assert!(text.contains("Scan: 9 rounds (no more content)"));
    }
}
