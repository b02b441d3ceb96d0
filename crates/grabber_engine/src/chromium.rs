use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures_util::StreamExt;
use grabber_logging::{grab_debug, grab_info, grab_warn};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::driver::{DriverError, Locator, PageDriver, ScrollTarget};
use crate::fetch::DEFAULT_USER_AGENT;
use crate::session::SessionLock;

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Persistent profile, so a manual login survives between runs.
    pub profile_dir: PathBuf,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub navigation_timeout: Duration,
    pub user_agent: String,
    pub chrome_path: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            profile_dir: PathBuf::from("browser_session"),
            headless: false,
            viewport_width: 1280,
            viewport_height: 900,
            navigation_timeout: Duration::from_secs(60),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_path: None,
        }
    }
}

const EXISTS_SCRIPT: &str = r#"(loc) => {
    const nodes = Array.from(document.querySelectorAll(loc.css));
    if (loc.text == null) return nodes.length > 0;
    return nodes.some((n) => (n.textContent || '').includes(loc.text));
}"#;

const CLICK_SCRIPT: &str = r#"(loc) => {
    const nodes = Array.from(document.querySelectorAll(loc.css));
    const node = loc.text == null
        ? nodes[0]
        : nodes.find((n) => (n.textContent || '').includes(loc.text));
    if (!node) return false;
    const target = node.closest('button, [role="button"], a') || node;
    target.scrollIntoView({ block: 'center' });
    target.dispatchEvent(new MouseEvent('click', { bubbles: true, cancelable: true, view: window }));
    return true;
}"#;

const SCROLL_SCRIPT: &str = r#"(args) => {
    const el = args.container ? document.querySelector(args.container) : null;
    const target = el || document.scrollingElement || document.documentElement;
    target.scrollTop = target.scrollHeight;
    if (args.jitter) {
        target.scrollTop = Math.max(0, target.scrollTop - 120);
        target.scrollTop = target.scrollHeight;
    }
    return true;
}"#;

/// A launched Chromium holding the profile lock until it is closed.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
    _lock: SessionLock,
}

impl ChromiumSession {
    pub async fn launch(settings: &BrowserSettings, lock: SessionLock) -> Result<Self, DriverError> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(&settings.profile_dir)
            .window_size(settings.viewport_width, settings.viewport_height)
            .request_timeout(settings.navigation_timeout)
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", settings.user_agent));
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(DriverError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| DriverError::Browser(err.to_string()))?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    grab_debug!("Browser handler error: {}", err);
                }
            }
        });
        grab_info!("Browser launched with profile {}", settings.profile_dir.display());

        Ok(Self {
            browser,
            handler,
            navigation_timeout: settings.navigation_timeout,
            _lock: lock,
        })
    }

    pub async fn open_driver(&self) -> Result<ChromiumDriver, DriverError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|err| DriverError::Browser(err.to_string()))?;
        Ok(ChromiumDriver {
            page,
            navigation_timeout: self.navigation_timeout,
        })
    }

    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            grab_warn!("Browser close error: {}", err);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}

/// [`PageDriver`] over one Chromium tab.
pub struct ChromiumDriver {
    page: Page,
    navigation_timeout: Duration,
}

impl ChromiumDriver {
    async fn call(&self, script: &str, args: &Value) -> Result<Value, String> {
        let params = EvaluateParams::builder()
            .expression(format!("({script})({args})"))
            .return_by_value(true)
            .await_promise(true)
            .build()?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|err| err.to_string())?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }
}

#[async_trait::async_trait]
impl PageDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(DriverError::Navigation(err.to_string())),
            Err(_) => Err(DriverError::Timeout(self.navigation_timeout)),
        }
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        self.page
            .url()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|err| DriverError::Query(err.to_string()))
    }

    async fn exists(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        let args = json!({ "css": locator.css, "text": locator.text });
        let value = self.call(EXISTS_SCRIPT, &args).await.map_err(DriverError::Query)?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn evaluate(&mut self, script: &str, args: Value) -> Result<Value, DriverError> {
        self.call(script, &args).await.map_err(DriverError::Script)
    }

    async fn click(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        let args = json!({ "css": locator.css, "text": locator.text });
        let value = self
            .call(CLICK_SCRIPT, &args)
            .await
            .map_err(DriverError::Interaction)?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn scroll(&mut self, target: &ScrollTarget, jitter: bool) -> Result<(), DriverError> {
        let container = match target {
            ScrollTarget::Container(sel) => Some(sel.as_str()),
            ScrollTarget::Page => None,
        };
        let args = json!({ "container": container, "jitter": jitter });
        self.call(SCROLL_SCRIPT, &args)
            .await
            .map(|_| ())
            .map_err(DriverError::Interaction)
    }
}
