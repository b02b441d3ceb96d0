//! Run configuration: an optional RON file layered under CLI flags.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use grabber_engine::{BrowserSettings, FetchSettings, OutputFeatures, ScanSettings, SelectorSet};
use grabber_logging::grab_info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILENAME: &str = "grabber.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrabberConfig {
    pub scan: ScanSection,
    pub fetch: FetchSection,
    pub browser: BrowserSection,
    pub output: OutputSection,
    /// `None` keeps logging on the terminal only.
    pub log_file: Option<PathBuf>,
    /// Offer a manual-login pause when the target sits behind a login wall.
    pub interactive: bool,
}

impl Default for GrabberConfig {
    fn default() -> Self {
        Self {
            scan: ScanSection::default(),
            fetch: FetchSection::default(),
            browser: BrowserSection::default(),
            output: OutputSection::default(),
            log_file: Some(PathBuf::from("grabber.log")),
            interactive: true,
        }
    }
}

impl GrabberConfig {
    /// Read `explicit` if given; otherwise `grabber.ron` in the working
    /// directory when present; otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILENAME);
                if fallback.is_file() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = ron::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        grab_info!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    pub max_rounds: u32,
    pub stagnant_threshold: u32,
    pub base_pause_ms: u64,
    pub max_jitter_ms: u64,
    pub drift_pause_ms: u64,
    pub click_settle_ms: u64,
    /// Wait after opening the target before checking access.
    pub access_settle_ms: u64,
    pub scroll_jitter: bool,
    pub selectors: SelectorSet,
}

impl Default for ScanSection {
    fn default() -> Self {
        let engine = ScanSettings::default();
        Self {
            max_rounds: engine.max_rounds,
            stagnant_threshold: engine.stagnant_threshold,
            base_pause_ms: millis(engine.base_pause),
            max_jitter_ms: millis(engine.max_jitter),
            drift_pause_ms: millis(engine.drift_pause),
            click_settle_ms: millis(engine.click_settle),
            access_settle_ms: 3_000,
            scroll_jitter: engine.scroll_jitter,
            selectors: engine.selectors,
        }
    }
}

impl ScanSection {
    pub fn to_settings(&self) -> ScanSettings {
        ScanSettings {
            max_rounds: self.max_rounds,
            stagnant_threshold: self.stagnant_threshold,
            base_pause: Duration::from_millis(self.base_pause_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
            drift_pause: Duration::from_millis(self.drift_pause_ms),
            click_settle: Duration::from_millis(self.click_settle_ms),
            scroll_jitter: self.scroll_jitter,
            selectors: self.selectors.clone(),
        }
    }

    pub fn access_settle(&self) -> Duration {
        Duration::from_millis(self.access_settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub user_agent: String,
    pub workers: usize,
}

impl Default for FetchSection {
    fn default() -> Self {
        let engine = FetchSettings::default();
        Self {
            connect_timeout_ms: millis(engine.connect_timeout),
            request_timeout_ms: millis(engine.request_timeout),
            redirect_limit: engine.redirect_limit,
            max_bytes: engine.max_bytes,
            user_agent: engine.user_agent,
            workers: engine.workers,
        }
    }
}

impl FetchSection {
    pub fn to_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            user_agent: self.user_agent.clone(),
            workers: self.workers.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    pub profile_dir: PathBuf,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub navigation_timeout_ms: u64,
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserSection {
    fn default() -> Self {
        let engine = BrowserSettings::default();
        Self {
            profile_dir: engine.profile_dir,
            headless: engine.headless,
            viewport_width: engine.viewport_width,
            viewport_height: engine.viewport_height,
            navigation_timeout_ms: millis(engine.navigation_timeout),
            chrome_path: engine.chrome_path,
        }
    }
}

impl BrowserSection {
    /// The browser reuses the fetch user agent so both look like one client.
    pub fn to_settings(&self, user_agent: &str) -> BrowserSettings {
        BrowserSettings {
            profile_dir: self.profile_dir.clone(),
            headless: self.headless,
            viewport_width: self.viewport_width,
            viewport_height: self.viewport_height,
            navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
            user_agent: user_agent.to_string(),
            chrome_path: self.chrome_path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub base_dir: PathBuf,
    pub features: OutputFeatures,
    /// Zip the run directory when the run ends.
    pub archive: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("downloads"),
            features: OutputFeatures::default(),
            archive: true,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
