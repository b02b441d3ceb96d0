use std::time::Duration;

use grabber_core::Target;
use grabber_logging::{grab_info, grab_warn};
use thiserror::Error;

use crate::driver::{DriverError, Locator, PageDriver};
use crate::selectors::AccessSelectors;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("access denied to {url}: {reason}")]
    AccessDenied { url: String, reason: String },
    #[error("could not open target: {0}")]
    Navigation(#[from] DriverError),
}

/// Asks a human to finish logging in inside the visible browser window.
#[async_trait::async_trait]
pub trait LoginPrompt: Send + Sync {
    /// Returns `false` when no manual login will happen.
    async fn wait_for_manual_login(&self, page_url: &str) -> bool;
}

/// Prompt for unattended runs: never waits, so a login wall is final.
#[derive(Debug, Default, Clone, Copy)]
pub struct NonInteractive;

#[async_trait::async_trait]
impl LoginPrompt for NonInteractive {
    async fn wait_for_manual_login(&self, _page_url: &str) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AccessProbe {
    login_required: bool,
    blocked: bool,
    content_visible: bool,
}

impl AccessProbe {
    fn accessible(&self) -> bool {
        !self.login_required && !self.blocked && self.content_visible
    }

    fn reason(&self) -> &'static str {
        if self.login_required {
            "login required"
        } else if self.blocked {
            "login wall over content"
        } else {
            "no post content found"
        }
    }
}

/// Open the target and make sure its content is viewable, offering one
/// manual-login pause through `prompt` when it is not.
pub async fn ensure_access<D>(
    driver: &mut D,
    target: &Target,
    selectors: &AccessSelectors,
    settle: Duration,
    prompt: &dyn LoginPrompt,
) -> Result<(), AccessError>
where
    D: PageDriver + ?Sized,
{
    let url = target.canonical_url();
    driver.navigate(url).await?;
    tokio::time::sleep(settle).await;

    let probe = probe_access(driver, selectors).await;
    if probe.accessible() {
        grab_info!("Target {} is accessible", target.id());
        return Ok(());
    }

    grab_warn!("Target {} not accessible: {}", target.id(), probe.reason());
    let page_url = driver.current_url().await.unwrap_or_else(|_| url.to_string());
    if !prompt.wait_for_manual_login(&page_url).await {
        return Err(AccessError::AccessDenied {
            url: url.to_string(),
            reason: probe.reason().to_string(),
        });
    }

    driver.navigate(url).await?;
    tokio::time::sleep(settle).await;
    if exists(driver, &selectors.login_form).await {
        return Err(AccessError::AccessDenied {
            url: url.to_string(),
            reason: "still logged out after manual login".to_string(),
        });
    }
    grab_info!("Access to {} verified after manual login", target.id());
    Ok(())
}

async fn probe_access<D>(driver: &mut D, selectors: &AccessSelectors) -> AccessProbe
where
    D: PageDriver + ?Sized,
{
    let on_login_url = driver
        .current_url()
        .await
        .map(|u| u.to_ascii_lowercase().contains("login"))
        .unwrap_or(false);
    let login_required = on_login_url || exists(driver, &selectors.login_form).await;
    let blocked = exists(driver, &selectors.login_wall).await;

    let mut content_visible = false;
    for marker in &selectors.content_markers {
        if exists(driver, &Locator::css(marker.as_str())).await {
            content_visible = true;
            break;
        }
    }

    AccessProbe {
        login_required,
        blocked,
        content_visible,
    }
}

async fn exists<D>(driver: &mut D, locator: &Locator) -> bool
where
    D: PageDriver + ?Sized,
{
    driver.exists(locator).await.unwrap_or(false)
}
