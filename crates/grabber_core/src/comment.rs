use serde::{Deserialize, Serialize};

/// Placeholder author when no user link could be found near a comment.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One scraped comment. Identity is the `(author, text)` pair, so two
/// identical comments from the same author collapse into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(rename = "user", default = "unknown_author")]
    pub author: String,
    pub text: String,
}

impl CommentRecord {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }

    /// Trim both fields and substitute [`UNKNOWN_AUTHOR`] for a blank author.
    /// Returns `None` when no text is left.
    pub fn normalized(self) -> Option<Self> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }
        let author = match self.author.trim() {
            "" => UNKNOWN_AUTHOR,
            other => other,
        };
        Some(Self::new(author, text))
    }

    pub(crate) fn signature(&self) -> (String, String) {
        (self.author.clone(), self.text.clone())
    }
}

fn unknown_author() -> String {
    UNKNOWN_AUTHOR.to_string()
}
