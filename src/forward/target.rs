//! Target URL extraction and normalization.
//!
//! The proxy is addressed as `https://proxyhost/<target-url>`. Everything
//! after the proxy's own origin is percent-decoded, classified, and then
//! scheme-repaired into an absolute URL.

use std::borrow::Cow;
use std::fmt;

use axum::http::Method;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::{ProxyError, ProxyResult};

/// Outcome of inspecting an inbound request URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Pre-flight or bare landing page (200).
    Landing,
    /// The path is not a usable target, `favicon.ico` and `robots.txt` included (400).
    Malformed,
    /// Forward to this target.
    Forward(TargetUrl),
}

/// A decoded, scheme-repaired absolute URL to forward to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    url: Url,
}

impl TargetUrl {
    /// Parse a repaired target string.
    pub fn parse(repaired: &str) -> ProxyResult<Self> {
        let url = Url::parse(repaired).map_err(|source| ProxyError::InvalidTarget {
            url: repaired.to_string(),
            source,
        })?;
        Ok(Self { url })
    }

    pub fn into_url(self) -> Url {
        self.url
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Inspect the inbound absolute URL and decide what to do with it.
pub fn extract_target(method: &Method, inbound_url: &str) -> ProxyResult<Extraction> {
    let candidate = decode_component(strip_origin(inbound_url))?;

    if is_forwardable(method, &candidate) {
        let repaired = repair_scheme(&candidate);
        return Ok(Extraction::Forward(TargetUrl::parse(&repaired)?));
    }

    if *method == Method::OPTIONS || candidate.is_empty() {
        Ok(Extraction::Landing)
    } else {
        Ok(Extraction::Malformed)
    }
}

/// Drop `<scheme>://<host>/` from the inbound URL.
///
/// Returns an empty string when nothing follows the host.
pub fn strip_origin(inbound_url: &str) -> &str {
    let rest = match inbound_url.find("://") {
        Some(i) => &inbound_url[i + 3..],
        None => inbound_url,
    };
    match rest.find('/') {
        Some(i) => &rest[i + 1..],
        None => "",
    }
}

/// Percent-decode with `decodeURIComponent` strictness.
///
/// A `%` not followed by two hex digits, or a result that is not UTF-8,
/// is rejected.
pub fn decode_component(encoded: &str) -> ProxyResult<String> {
    let bytes = encoded.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape_ok = bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit);
            if !escape_ok {
                return Err(ProxyError::MalformedEncoding(encoded.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(encoded)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|_| ProxyError::MalformedEncoding(encoded.to_string()))
}

/// Restore a collapsed `://` or add a default `http://` scheme.
pub fn repair_scheme(candidate: &str) -> String {
    if candidate.contains("://") {
        candidate.to_string()
    } else if candidate.contains(":/") {
        candidate.replacen(":/", "://", 1)
    } else {
        format!("http://{}", candidate)
    }
}

fn is_forwardable(method: &Method, candidate: &str) -> bool {
    *method != Method::OPTIONS
        // Length in UTF-16 code units, as browsers measure strings
        && candidate.encode_utf16().count() >= 3
        && candidate.contains('.')
        && !is_browser_probe(candidate)
}

fn is_browser_probe(candidate: &str) -> bool {
    candidate == "favicon.ico" || candidate == "robots.txt"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward_url(method: Method, inbound: &str) -> String {
        match extract_target(&method, inbound).unwrap() {
            Extraction::Forward(target) => target.to_string(),
            other => panic!("expected forward, got {:?}", other),
        }
    }

    #[test]
    fn test_strip_origin() {
        assert_eq!(strip_origin("https://proxy.dev/http://a.com/x"), "http://a.com/x");
        assert_eq!(strip_origin("http://proxy.dev:8080/a.com"), "a.com");
        assert_eq!(strip_origin("https://proxy.dev/"), "");
        assert_eq!(strip_origin("https://proxy.dev"), "");
    }

    #[test]
    fn test_full_scheme_kept() {
        assert_eq!(
            forward_url(Method::GET, "https://proxy.dev/http://example.com/foo"),
            "http://example.com/foo"
        );
        assert_eq!(
            forward_url(Method::GET, "https://proxy.dev/https://api.github.com/repos?page=2"),
            "https://api.github.com/repos?page=2"
        );
    }

    #[test]
    fn test_missing_scheme_repaired() {
        assert_eq!(
            forward_url(Method::GET, "https://proxy.dev/example.com/foo"),
            "http://example.com/foo"
        );
    }

    #[test]
    fn test_collapsed_slash_repaired() {
        assert_eq!(
            forward_url(Method::GET, "https://proxy.dev/http:/example.com/foo"),
            "http://example.com/foo"
        );
        assert_eq!(repair_scheme("https:/a.com/b:/c"), "https://a.com/b:/c");
    }

    #[test]
    fn test_percent_decoded() {
        assert_eq!(
            forward_url(Method::GET, "https://proxy.dev/https%3A%2F%2Fexample.com%2Fa%3Fq%3D1"),
            "https://example.com/a?q=1"
        );
    }

    #[test]
    fn test_malformed_escape_is_error() {
        let err = extract_target(&Method::GET, "https://proxy.dev/http://a.com/%zz").unwrap_err();
        assert!(matches!(err, ProxyError::MalformedEncoding(_)));

        let err = extract_target(&Method::GET, "https://proxy.dev/http://a.com/%E0%A4%A").unwrap_err();
        assert!(matches!(err, ProxyError::MalformedEncoding(_)));

        // Valid escapes that do not form UTF-8
        let err = extract_target(&Method::GET, "https://proxy.dev/http://a.com/%FF").unwrap_err();
        assert!(matches!(err, ProxyError::MalformedEncoding(_)));
    }

    #[test]
    fn test_preflight_is_landing() {
        let result = extract_target(&Method::OPTIONS, "https://proxy.dev/http://example.com/foo").unwrap();
        assert_eq!(result, Extraction::Landing);
    }

    #[test]
    fn test_empty_path_is_landing() {
        assert_eq!(extract_target(&Method::GET, "https://proxy.dev/").unwrap(), Extraction::Landing);
    }

    #[test]
    fn test_favicon_and_robots_are_malformed() {
        assert_eq!(
            extract_target(&Method::GET, "https://proxy.dev/favicon.ico").unwrap(),
            Extraction::Malformed
        );
        assert_eq!(
            extract_target(&Method::GET, "https://proxy.dev/robots.txt").unwrap(),
            Extraction::Malformed
        );
        assert!(!is_forwardable(&Method::GET, "favicon.ico"));
    }

    #[test]
    fn test_length_counts_utf16_units() {
        // One astral character is two UTF-16 units
        assert!(is_forwardable(&Method::GET, "\u{1F600}."));
        assert!(!is_forwardable(&Method::GET, "\u{e9}."));
    }

    #[test]
    fn test_short_or_dotless_is_malformed() {
        assert_eq!(extract_target(&Method::GET, "https://proxy.dev/ab").unwrap(), Extraction::Malformed);
        assert_eq!(extract_target(&Method::GET, "https://proxy.dev/a.").unwrap(), Extraction::Malformed);
        assert_eq!(
            extract_target(&Method::POST, "https://proxy.dev/localhost/api").unwrap(),
            Extraction::Malformed
        );
    }

    #[test]
    fn test_unparsable_target() {
        let err = extract_target(&Method::GET, "https://proxy.dev/http://exa mple.com/").unwrap_err();
        assert!(matches!(err, ProxyError::InvalidTarget { .. }));
    }
}
