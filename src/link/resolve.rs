/// Schemes whose links are followed
const FOLLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// A resolved link: its scheme and its scheme-less frontier key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub scheme: String,
    pub key: String,
}

impl Link {
    /// Absolute URL handed to the transport
    pub fn fetch_url(&self) -> String {
        format!("{}://{}", self.scheme, self.key)
    }
}

/// Returns the scheme of `url`, if it starts with one
pub fn scheme_of(url: &str) -> Option<&str> {
    let (scheme, _) = url.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(scheme)
}

/// Removes a leading `scheme://` or `//` from `url`
///
/// # Examples
///
/// ```
/// use spindle::link::strip_scheme;
///
/// assert_eq!(strip_scheme("https://example.com/a"), "example.com/a");
/// assert_eq!(strip_scheme("//cdn.example.com/x"), "cdn.example.com/x");
/// assert_eq!(strip_scheme("example.com/a"), "example.com/a");
/// ```
pub fn strip_scheme(url: &str) -> &str {
    if let Some(rest) = url.strip_prefix("//") {
        return rest;
    }
    match scheme_of(url) {
        Some(scheme) => url[scheme.len() + 1..]
            .strip_prefix("//")
            .unwrap_or(url),
        None => url,
    }
}

/// Resolves a raw link found in the page at `current`
///
/// * `#frag` appends the fragment text as a new segment of the directory of
///   the current page: `#frag` on `http://example.com/a/b` gives
///   `example.com/a/frag`.
/// * `//host/path` keeps the current scheme.
/// * `/path` is joined to the current host.
/// * `http(s)://…` is taken as is; other schemes (`mailto:`, `javascript:`,
///   `data:`…) are not followed.
/// * Anything else is treated as already absolute and passed through.
///
/// Returns `None` for links that cannot be followed.
pub fn resolve_link(raw: &str, current: &str) -> Option<Link> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let current_scheme = scheme_of(current).unwrap_or("http");
    let current_stripped = strip_scheme(current);

    let (scheme, key) = if let Some(fragment) = raw.strip_prefix('#') {
        if fragment.is_empty() {
            return None;
        }
        let directory = current_stripped
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or(current_stripped);
        (current_scheme, format!("{}/{}", directory, fragment))
    } else if let Some(rest) = raw.strip_prefix("//") {
        (current_scheme, rest.to_string())
    } else if raw.starts_with('/') {
        let host = current_stripped
            .split_once('/')
            .map(|(host, _)| host)
            .unwrap_or(current_stripped);
        (current_scheme, format!("{}{}", host, raw))
    } else if let Some(scheme) = scheme_of(raw) {
        if !FOLLOWED_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
            return None;
        }
        (scheme, strip_scheme(raw).to_string())
    } else {
        (current_scheme, raw.to_string())
    };

    if key.trim_matches('/').is_empty() {
        return None;
    }

    Some(Link {
        scheme: scheme.to_ascii_lowercase(),
        key,
    })
}

/// Resolves a raw link to its scheme-less absolute form
///
/// # Examples
///
/// ```
/// use spindle::link::resolve;
///
/// assert_eq!(resolve("/c", "http://example.com/a/b").as_deref(), Some("example.com/c"));
/// assert_eq!(resolve("#frag", "http://example.com/a/b").as_deref(), Some("example.com/a/frag"));
/// ```
pub fn resolve(raw: &str, current: &str) -> Option<String> {
    resolve_link(raw, current).map(|link| link.key)
}
