use std::fmt;

use url::Url;

/// Path segments that introduce a post shortcode.
const POST_PREFIXES: &[&str] = &["p", "reel", "reels", "tv"];

/// Single-segment paths that belong to the site rather than to a user.
const RESERVED_PATHS: &[&str] = &[
    "explore", "accounts", "direct", "reels", "stories", "about", "legal",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Post,
    Profile,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Post => write!(f, "post"),
            TargetKind::Profile => write!(f, "profile"),
        }
    }
}

/// The canonical post or profile a run is about. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    kind: TargetKind,
    id: String,
    canonical_url: String,
}

impl Target {
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn canonical_url(&self) -> &str {
        &self.canonical_url
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("unrecognized input: {0}")]
    UnrecognizedInput(String),
}

/// Derive a [`Target`] from a user supplied URL.
///
/// Post paths (`/p/`, `/reel/`, `/reels/`, `/tv/`) win over profile paths. A
/// profile is only accepted when the path has exactly one segment. Callers
/// are expected to test for a local path before calling this.
pub fn identify_target(raw: &str) -> Result<Target, InputError> {
    let trimmed = raw.trim();
    let url = parse_lenient(trimmed)
        .ok_or_else(|| InputError::UnrecognizedInput(trimmed.to_string()))?;
    let origin = origin_of(&url)
        .ok_or_else(|| InputError::UnrecognizedInput(trimmed.to_string()))?;

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    if let Some(id) = find_post_id(&segments) {
        return Ok(Target {
            kind: TargetKind::Post,
            canonical_url: format!("{origin}/p/{id}/"),
            id: id.to_string(),
        });
    }

    if let [handle] = segments.as_slice() {
        if is_handle(handle) && !RESERVED_PATHS.contains(&handle.to_ascii_lowercase().as_str()) {
            return Ok(Target {
                kind: TargetKind::Profile,
                canonical_url: format!("{origin}/{handle}/"),
                id: handle.to_string(),
            });
        }
    }

    Err(InputError::UnrecognizedInput(trimmed.to_string()))
}

/// Strip query, fragment and trailing slash so two page URLs compare by path.
pub fn normalize_page_url(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    raw[..end].trim_end_matches('/').to_string()
}

fn parse_lenient(input: &str) -> Option<Url> {
    if input.is_empty() || input.chars().any(char::is_whitespace) {
        return None;
    }
    match Url::parse(input) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(_) => None,
        Err(url::ParseError::RelativeUrlWithoutBase) if looks_like_host_path(input) => {
            Url::parse(&format!("https://{input}")).ok()
        }
        Err(_) => None,
    }
}

fn looks_like_host_path(input: &str) -> bool {
    let host = input.split('/').next().unwrap_or_default();
    host.contains('.') && !host.starts_with('.') && !host.ends_with('.')
}

fn origin_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    })
}

fn find_post_id<'a>(segments: &[&'a str]) -> Option<&'a str> {
    segments.windows(2).find_map(|pair| {
        let prefix = pair[0].to_ascii_lowercase();
        (POST_PREFIXES.contains(&prefix.as_str()) && is_shortcode(pair[1])).then_some(pair[1])
    })
}

fn is_shortcode(seg: &str) -> bool {
    !seg.is_empty()
        && seg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_handle(seg: &str) -> bool {
    !seg.is_empty()
        && seg.len() <= 30
        && seg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reel_normalises_to_post_path() {
        let target = identify_target("https://www.instagram.com/reel/Cx_9-a/?igsh=abc").unwrap();
        assert_eq!(target.kind(), TargetKind::Post);
        assert_eq!(target.id(), "Cx_9-a");
        assert_eq!(target.canonical_url(), "https://www.instagram.com/p/Cx_9-a/");
    }

    #[test]
    fn scheme_less_input_is_retried_with_https() {
        let target = identify_target("instagram.com/p/XYZ").unwrap();
        assert_eq!(target.canonical_url(), "https://instagram.com/p/XYZ/");
    }

    #[test]
    fn reserved_single_segment_is_not_a_profile() {
        assert!(identify_target("https://site.example/explore/").is_err());
    }

    #[test]
    fn deep_non_post_path_is_rejected() {
        assert!(identify_target("https://site.example/someone/tagged/").is_err());
    }

    #[test]
    fn port_is_kept_in_canonical_url() {
        let target = identify_target("http://127.0.0.1:8080/p/abc").unwrap();
        assert_eq!(target.canonical_url(), "http://127.0.0.1:8080/p/abc/");
    }

    #[test]
    fn normalize_strips_query_fragment_and_slash() {
        assert_eq!(
            normalize_page_url("https://a.example/p/x/?utm=1#c"),
            "https://a.example/p/x"
        );
        assert_eq!(normalize_page_url("https://a.example/p/x"), "https://a.example/p/x");
    }
}
