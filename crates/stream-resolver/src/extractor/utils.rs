use regex::Regex;
use std::borrow::Cow;
use url::{Position, Url};

/// Every first capture group of `re` in `input`, in match order.
pub fn capture_groups_1<'a>(re: &'a Regex, input: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    re.captures_iter(input)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Returns `host[:port]` of an absolute http(s) URL.
pub fn authority_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Replaces the network authority of `url`, keeping scheme, path and query.
pub fn swap_authority(url: &str, authority: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if parsed.host_str().is_none() {
        return None;
    }
    Some(format!(
        "{}://{}{}",
        parsed.scheme(),
        authority,
        &parsed[Position::BeforePath..]
    ))
}

/// Resolves a possibly relative or protocol-relative URL against `base`.
///
/// Only http(s) results are returned; `javascript:`, `data:` and friends
/// resolve to `None`.
pub fn resolve_url(raw: &str, base: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let resolved = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base).ok()?.join(raw).ok()?,
        Err(_) => return None,
    };

    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// Value of the first `key` query parameter, for absolute or relative URLs.
pub fn query_param(url: &str, key: &str) -> Option<String> {
    let parsed = Url::parse(url)
        .or_else(|_| Url::parse("http://relative.invalid/").and_then(|b| b.join(url)))
        .ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Undoes the escaping scripts apply to embedded URLs (`https:\/\/`, `&`).
pub fn unescape_script_text(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.replace("\\/", "/")
            .replace("\\u0026", "&")
            .replace("\\u003d", "=")
            .replace("\\u003D", "="),
    )
}

/// Last path segment of a URL without query, used as a file name.
pub fn file_name_of(url: &str) -> Option<String> {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end]
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_includes_port() {
        assert_eq!(
            authority_of("https://cdn.example.com:8443/path?x=1"),
            Some("cdn.example.com:8443".to_string())
        );
        assert_eq!(authority_of("http://cdn.example.com"), Some("cdn.example.com".to_string()));
        assert_eq!(authority_of("/relative/path"), None);
        assert_eq!(authority_of("rtmp://example.com/live"), None);
    }

    #[test]
    fn swaps_authority_preserving_path_and_query() {
        assert_eq!(
            swap_authority("https://www.animesaturn.cx/watch?file=abc&s=alt", "mirror.example:8080"),
            Some("https://mirror.example:8080/watch?file=abc&s=alt".to_string())
        );
    }

    #[test]
    fn resolves_relative_forms() {
        let base = "https://www.animesaturn.cx/watch?file=abc";
        assert_eq!(
            resolve_url("//cdn.example/a.mp4", base),
            Some("https://cdn.example/a.mp4".to_string())
        );
        assert_eq!(
            resolve_url("/watch?file=abc&s=alt", base),
            Some("https://www.animesaturn.cx/watch?file=abc&s=alt".to_string())
        );
        assert_eq!(
            resolve_url("https://cdn.example/a.mp4", base),
            Some("https://cdn.example/a.mp4".to_string())
        );
        assert_eq!(resolve_url("javascript:void(0)", base), None);
        assert_eq!(resolve_url("", base), None);
    }

    #[test]
    fn reads_query_params_of_relative_urls() {
        assert_eq!(query_param("/watch?file=abc&server=2", "server"), Some("2".to_string()));
        assert_eq!(query_param("https://x.example/watch?s=alt", "s"), Some("alt".to_string()));
        assert_eq!(query_param("https://x.example/watch", "s"), None);
    }

    #[test]
    fn unescapes_json_slashes() {
        assert_eq!(
            unescape_script_text(r"https:\/\/cdn.example\/a.m3u8?a=1&b=2"),
            "https://cdn.example/a.m3u8?a=1&b=2"
        );
    }

    #[test]
    fn file_name_drops_query() {
        assert_eq!(
            file_name_of("https://cdn.example/dir/ep01.mp4?token=x"),
            Some("ep01.mp4".to_string())
        );
        assert_eq!(file_name_of("https://cdn.example/dir/"), None);
    }
}
