use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A CSS selector, optionally narrowed to elements whose text contains
/// `text`. Plain CSS cannot match on text, so drivers handle that part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub css: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: None,
        }
    }

    pub fn with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: Some(text.into()),
        }
    }

    /// Restrict the locator to descendants of `container`.
    pub fn within(&self, container: Option<&str>) -> Self {
        match container {
            Some(scope) => Self {
                css: format!("{scope} {}", self.css),
                text: self.text.clone(),
            },
            None => self.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollTarget {
    Container(String),
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("query failed: {0}")]
    Query(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("interaction failed: {0}")]
    Interaction(String),
    #[error("browser unavailable: {0}")]
    Browser(String),
}

/// Exclusive control of one browser tab.
///
/// Every method takes `&mut self`: the scan engine owns the driver for the
/// whole scan and awaits each call before issuing the next, so the tab never
/// sees concurrent access. `Ok(false)` from [`exists`](Self::exists) and
/// [`click`](Self::click) means "no match", which is different from a failed
/// query.
#[async_trait::async_trait]
pub trait PageDriver: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    async fn current_url(&mut self) -> Result<String, DriverError>;

    async fn exists(&mut self, locator: &Locator) -> Result<bool, DriverError>;

    /// Run `script`, a JavaScript function expression, with `args` as its
    /// single argument and return its JSON result.
    async fn evaluate(&mut self, script: &str, args: Value) -> Result<Value, DriverError>;

    async fn click(&mut self, locator: &Locator) -> Result<bool, DriverError>;

    async fn scroll(&mut self, target: &ScrollTarget, jitter: bool) -> Result<(), DriverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_prefixes_scope_and_keeps_text() {
        let locator = Locator::with_text("span", "View all");
        let scoped = locator.within(Some("div.comments"));
        assert_eq!(scoped.css, "div.comments span");
        assert_eq!(scoped.text.as_deref(), Some("View all"));
        assert_eq!(locator.within(None), locator);
    }
}
