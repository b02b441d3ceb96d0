use url::Url;

/// Query keys that proxies use to carry the real asset address.
const INNER_URL_KEYS: &[&str] = &["url", "u"];

/// Hosts that serve sticker bytes directly and must never be unwrapped.
pub fn is_direct_media_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    (host.starts_with("media") && host.ends_with(".giphy.com"))
        || host == "i.giphy.com"
        || host.ends_with(".cdninstagram.com")
        || host.ends_with(".fbcdn.net")
}

/// Best-effort resolution of a proxied sticker URL to the address that
/// actually serves the bytes. Returns the input unchanged when nothing better
/// is found.
pub fn resolve_direct_asset_url(proxy_url: &str) -> String {
    let Ok(url) = Url::parse(proxy_url) else {
        return proxy_url.to_string();
    };
    if url.host_str().is_some_and(is_direct_media_host) {
        return proxy_url.to_string();
    }

    url.query_pairs()
        .filter(|(key, _)| INNER_URL_KEYS.contains(&key.as_ref()))
        .find_map(|(_, value)| {
            Url::parse(&value)
                .ok()
                .filter(|inner| matches!(inner.scheme(), "http" | "https"))
                .map(|_| value.into_owned())
        })
        .unwrap_or_else(|| proxy_url.to_string())
}

/// File extension (with dot) for a sticker, inferred from its source URL.
pub fn sticker_extension(url: &str) -> &'static str {
    let lower = url.to_ascii_lowercase();
    if lower.contains(".webp") {
        ".webp"
    } else if lower.contains(".mp4") {
        ".mp4"
    } else {
        ".gif"
    }
}

/// `sticker_0007.webp` style name for the 1-based `index`.
pub fn sticker_filename(index: usize, extension: &str) -> String {
    format!("sticker_{index:04}{extension}")
}
