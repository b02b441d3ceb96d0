use serde::{Deserialize, Serialize};

use crate::driver::Locator;

/// How far up from a comment node the author lookup walks.
pub const MAX_AUTHOR_DEPTH: u32 = 5;

/// Selectors the scan relies on. Every list is an ordered set of probes;
/// the first candidate that matches wins and misses are not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub containers: Vec<String>,
    pub sticker_images: Vec<String>,
    pub comment_text: Vec<String>,
    pub user_link: String,
    pub load_more: Vec<Locator>,
    pub view_replies: Vec<Locator>,
    pub access: AccessSelectors,
}

impl Default for SelectorSet {
    fn default() -> Self {
        Self {
            containers: vec![
                "div.x5yr21d.xw2csxc.x1odjw0f.x1n2onr6".to_string(),
                "div[role='dialog'] article ul".to_string(),
                "article ul".to_string(),
                "article".to_string(),
                "main".to_string(),
            ],
            sticker_images: vec![
                "img[src*='giphy.com']".to_string(),
                "img.x12ol6y4".to_string(),
            ],
            comment_text: vec!["ul li span[dir='auto']".to_string()],
            user_link: "a[href^='/'][role='link']".to_string(),
            load_more: vec![
                Locator::css("svg[aria-label='Load more comments']"),
                Locator::with_text("button", "Load more"),
            ],
            view_replies: vec![
                Locator::with_text("span", "View all"),
                Locator::with_text("span", "replies"),
            ],
            access: AccessSelectors::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessSelectors {
    pub login_form: Locator,
    pub login_wall: Locator,
    pub content_markers: Vec<String>,
}

impl Default for AccessSelectors {
    fn default() -> Self {
        Self {
            login_form: Locator::css("input[name='username']"),
            login_wall: Locator::with_text("div[role='dialog'] button", "Log In"),
            content_markers: vec!["section".to_string(), "article".to_string()],
        }
    }
}

/// Collects sticker sources and comment text below `args.container` (or the
/// whole document). Returns `{ stickers: [url], comments: [{user, text}] }`.
pub const EXTRACTION_SCRIPT: &str = r#"(args) => {
    const root = args.container ? document.querySelector(args.container) : document;
    const out = { stickers: [], comments: [] };
    if (!root) return out;
    for (const sel of args.stickerSelectors) {
        root.querySelectorAll(sel).forEach((img) => {
            const src = img.currentSrc || img.src;
            if (src) out.stickers.push(src);
        });
    }
    for (const sel of args.commentSelectors) {
        root.querySelectorAll(sel).forEach((node) => {
            const text = (node.innerText || node.textContent || '').trim();
            if (!text) return;
            let user = 'Unknown';
            let el = node.parentElement;
            for (let depth = 0; el && depth < args.maxAuthorDepth; depth += 1) {
                const link = el.querySelector(args.userLink);
                if (link && !link.contains(node)) {
                    const name = (link.innerText || link.textContent || '').trim();
                    if (name) { user = name; break; }
                }
                el = el.parentElement;
            }
            if (text !== user) out.comments.push({ user, text });
        });
    }
    return out;
}"#;
