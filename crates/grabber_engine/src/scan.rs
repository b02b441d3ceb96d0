use std::time::Duration;

use grabber_core::{normalize_page_url, RoundVerdict, RoundYield, ScanState, Target};
use grabber_logging::{grab_debug, grab_info, grab_trace, grab_warn};
use rand::Rng;
use serde_json::json;

use crate::driver::{Locator, PageDriver, ScrollTarget};
use crate::fetch::ProgressSink;
use crate::selectors::{SelectorSet, EXTRACTION_SCRIPT, MAX_AUTHOR_DEPTH};
use crate::{EngineEvent, ScanProgress, ScanReport, StopReason};

#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub max_rounds: u32,
    /// Consecutive rounds without sticker growth before the scan may stop.
    pub stagnant_threshold: u32,
    pub base_pause: Duration,
    pub max_jitter: Duration,
    /// Pause after re-navigating away from an unexpected page.
    pub drift_pause: Duration,
    /// Pause after a successful load-more or view-replies click.
    pub click_settle: Duration,
    pub scroll_jitter: bool,
    pub selectors: SelectorSet,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_rounds: 150,
            stagnant_threshold: 8,
            base_pause: Duration::from_millis(2_000),
            max_jitter: Duration::from_millis(500),
            drift_pause: Duration::from_secs(2),
            click_settle: Duration::from_millis(800),
            scroll_jitter: true,
            selectors: SelectorSet::default(),
        }
    }
}

/// Scan `target` until the round limit or until content is exhausted.
///
/// Never fails: every driver error inside a round degrades to "nothing new
/// this round". The driver must already be on the target page.
pub async fn scan_target<D>(
    driver: &mut D,
    target: &Target,
    settings: &ScanSettings,
    sink: &dyn ProgressSink,
) -> ScanReport
where
    D: PageDriver + ?Sized,
{
    let mut scan = Scan {
        driver,
        target,
        settings,
        state: ScanState::new(),
    };
    let mut rounds = 0;
    let mut stop = StopReason::RoundLimit;

    for round in 0..settings.max_rounds {
        rounds = round + 1;
        scan.state.begin_round(round);

        scan.recover_from_drift().await;
        let container = scan.resolve_container().await;
        let found = scan.extract(container.as_deref()).await;
        let load_more_visible = scan.load_more_visible(container.as_deref()).await;
        let (added, verdict) = scan.state.observe_round(
            found,
            settings.stagnant_threshold,
            load_more_visible,
        );
        grab_debug!(
            "Round {} added {} stickers, {} comments",
            round + 1,
            added.new_stickers,
            added.new_comments
        );

        sink.emit(EngineEvent::ScanRound(ScanProgress {
            round,
            stickers: scan.state.sticker_count(),
            comments: scan.state.comment_count(),
            stagnant_rounds: scan.state.stagnant_rounds(),
            container: container.clone(),
        }));

        if verdict == RoundVerdict::Exhausted {
            grab_info!(
                "No more content after {} rounds ({} stickers, {} comments)",
                rounds,
                scan.state.sticker_count(),
                scan.state.comment_count()
            );
            stop = StopReason::Exhausted;
            break;
        }

        scan.interact(container.as_deref()).await;
        scan.advance(container).await;
    }

    ScanReport {
        outcome: scan.state.into_outcome(),
        rounds,
        stop,
    }
}

struct Scan<'a, D: PageDriver + ?Sized> {
    driver: &'a mut D,
    target: &'a Target,
    settings: &'a ScanSettings,
    state: ScanState,
}

impl<D: PageDriver + ?Sized> Scan<'_, D> {
    async fn recover_from_drift(&mut self) {
        let current = match self.driver.current_url().await {
            Ok(url) => url,
            Err(err) => {
                grab_debug!("Could not read page url: {}", err);
                return;
            }
        };
        let expected = normalize_page_url(self.target.canonical_url());
        if normalize_page_url(&current) == expected {
            return;
        }

        grab_warn!("Navigation drift to {}, returning to {}", current, expected);
        if let Err(err) = self.driver.navigate(self.target.canonical_url()).await {
            grab_warn!("Drift recovery navigation failed: {}", err);
        }
        tokio::time::sleep(self.settings.drift_pause).await;
    }

    async fn resolve_container(&mut self) -> Option<String> {
        for candidate in &self.settings.selectors.containers {
            match self.driver.exists(&Locator::css(candidate.as_str())).await {
                Ok(true) => return Some(candidate.clone()),
                Ok(false) => {}
                Err(err) => grab_trace!("Container probe {} failed: {}", candidate, err),
            }
        }
        None
    }

    async fn extract(&mut self, container: Option<&str>) -> RoundYield {
        let selectors = &self.settings.selectors;
        let args = json!({
            "container": container,
            "stickerSelectors": selectors.sticker_images,
            "commentSelectors": selectors.comment_text,
            "userLink": selectors.user_link,
            "maxAuthorDepth": MAX_AUTHOR_DEPTH,
        });
        let value = match self.driver.evaluate(EXTRACTION_SCRIPT, args).await {
            Ok(value) => value,
            Err(err) => {
                grab_debug!("Round {} extraction failed: {}", self.state.round_index(), err);
                return RoundYield::default();
            }
        };
        serde_json::from_value(value).unwrap_or_else(|err| {
            grab_debug!("Round {} extraction returned bad data: {}", self.state.round_index(), err);
            RoundYield::default()
        })
    }

    async fn load_more_visible(&mut self, container: Option<&str>) -> bool {
        for locator in &self.settings.selectors.load_more {
            if let Ok(true) = self.driver.exists(&locator.within(container)).await {
                return true;
            }
        }
        false
    }

    async fn interact(&mut self, container: Option<&str>) {
        let groups = [
            &self.settings.selectors.load_more,
            &self.settings.selectors.view_replies,
        ];
        for group in groups {
            for locator in group {
                match self.driver.click(&locator.within(container)).await {
                    Ok(true) => {
                        grab_trace!("Clicked {:?}", locator);
                        tokio::time::sleep(self.settings.click_settle).await;
                        break;
                    }
                    Ok(false) => {}
                    Err(err) => grab_trace!("Click on {:?} failed: {}", locator, err),
                }
            }
        }
    }

    async fn advance(&mut self, container: Option<String>) {
        let target = container.map_or(ScrollTarget::Page, ScrollTarget::Container);
        if let Err(err) = self
            .driver
            .scroll(&target, self.settings.scroll_jitter)
            .await
        {
            grab_trace!("Scroll failed: {}", err);
        }
        tokio::time::sleep(round_pause(self.settings)).await;
    }
}

fn round_pause(settings: &ScanSettings) -> Duration {
    let max_ms = settings.max_jitter.as_millis() as u64;
    if max_ms == 0 {
        return settings.base_pause;
    }
    settings.base_pause + Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_stays_within_jitter_bounds() {
        let settings = ScanSettings {
            base_pause: Duration::from_millis(100),
            max_jitter: Duration::from_millis(50),
            ..ScanSettings::default()
        };
        for _ in 0..50 {
            let pause = round_pause(&settings);
            assert!(pause >= Duration::from_millis(100));
            assert!(pause <= Duration::from_millis(150));
        }
    }

    #[test]
    fn zero_jitter_is_exact() {
        let settings = ScanSettings {
            base_pause: Duration::from_millis(10),
            max_jitter: Duration::ZERO,
            ..ScanSettings::default()
        };
        assert_eq!(round_pause(&settings), Duration::from_millis(10));
    }
}
