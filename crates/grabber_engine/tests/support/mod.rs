#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use grabber_core::{CommentRecord, RoundYield};
use grabber_engine::{
    DriverError, EngineEvent, Locator, PageDriver, ProgressSink, ScrollTarget, EXTRACTION_SCRIPT,
};
use serde_json::{json, Value};

/// One scripted answer to the extraction script.
#[derive(Debug, Clone)]
pub enum Extraction {
    Found(RoundYield),
    Fails,
}

pub fn found(stickers: &[&str], comments: &[(&str, &str)]) -> Extraction {
    Extraction::Found(RoundYield {
        stickers: stickers.iter().map(|s| s.to_string()).collect(),
        comments: comments
            .iter()
            .map(|(a, t)| CommentRecord::new(*a, *t))
            .collect(),
    })
}

/// Scripted stand-in for a browser tab.
///
/// `present` lists selectors that exist; a scoped locator matches when its
/// CSS ends with one of them, so `"article svg.more"` matches `"svg.more"`.
#[derive(Debug, Default)]
pub struct FakeDriver {
    pub url: String,
    pub present: HashSet<String>,
    pub extractions: VecDeque<Extraction>,
    /// Answer used once `extractions` runs dry.
    pub steady: Option<Extraction>,
    pub redirect_on_scroll: VecDeque<String>,
    pub clickable: HashSet<String>,
    pub failing_clicks: bool,

    pub navigations: Vec<String>,
    pub extraction_args: Vec<Value>,
    pub clicks: Vec<Locator>,
    pub scrolls: Vec<ScrollTarget>,
}

impl FakeDriver {
    pub fn on(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn with_present(mut self, selectors: &[&str]) -> Self {
        self.present.extend(selectors.iter().map(|s| s.to_string()));
        self
    }

    pub fn with_extractions(mut self, rounds: Vec<Extraction>) -> Self {
        self.extractions = rounds.into();
        self
    }

    pub fn with_steady(mut self, extraction: Extraction) -> Self {
        self.steady = Some(extraction);
        self
    }

    fn matches(&self, locator: &Locator) -> bool {
        self.present.iter().any(|p| locator.css.ends_with(p.as_str()))
    }

    pub fn extraction_count(&self) -> usize {
        self.extraction_args.len()
    }
}

#[async_trait::async_trait]
impl PageDriver for FakeDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.navigations.push(url.to_string());
        self.url = url.to_string();
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, DriverError> {
        Ok(self.url.clone())
    }

    async fn exists(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        Ok(self.matches(locator))
    }

    async fn evaluate(&mut self, script: &str, args: Value) -> Result<Value, DriverError> {
        if script != EXTRACTION_SCRIPT {
            return Ok(Value::Null);
        }
        self.extraction_args.push(args);
        let next = self
            .extractions
            .pop_front()
            .or_else(|| self.steady.clone())
            .unwrap_or(Extraction::Found(RoundYield::default()));
        match next {
            Extraction::Found(round) => Ok(json!({
                "stickers": round.stickers,
                "comments": round.comments,
            })),
            Extraction::Fails => Err(DriverError::Script("detached frame".to_string())),
        }
    }

    async fn click(&mut self, locator: &Locator) -> Result<bool, DriverError> {
        if self.failing_clicks {
            return Err(DriverError::Interaction("element detached".to_string()));
        }
        let hit = self.clickable.iter().any(|c| locator.css.ends_with(c.as_str()));
        if hit {
            self.clicks.push(locator.clone());
        }
        Ok(hit)
    }

    async fn scroll(&mut self, target: &ScrollTarget, _jitter: bool) -> Result<(), DriverError> {
        self.scrolls.push(target.clone());
        if let Some(next) = self.redirect_on_scroll.pop_front() {
            self.url = next;
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct TestSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl TestSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}
