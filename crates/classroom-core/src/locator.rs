//! Media locator parsing.
//!
//! A submission's media is described either by a blob key stored on the
//! record or, for records written before keys were stored, by a display URL
//! in one of several historical formats:
//!
//! - a bare key: `videos/course_1/student_9/clip.mp4`
//! - a virtual-hosted URL: `https://media.s3.amazonaws.com/videos/...`
//! - a path-style URL: `https://s3.amazonaws.com/media/videos/...`
//! - a CDN URL with query parameters: `https://cdn.example.com/videos/...?sig=...`
//!
//! [`blob_key_from_locator`] recovers the key from any of these. It is a
//! compatibility shim for legacy records; [`resolve_media_key`] only falls
//! back to it when no key is stored.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// Matches a network scheme prefix such as `https://`.
fn scheme_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://").expect("valid regex"))
}

/// Captures the last four path segments of an unparseable URL.
fn tail_segments_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([^/?#]+/[^/?#]+/[^/?#]+/[^/?#]+)/?(?:[?#].*)?$").expect("valid regex")
    })
}

/// Resolve the blob key for one media slot of a record.
///
/// A stored key wins over the locator. Externally hosted media never
/// resolves to a key.
#[must_use]
pub fn resolve_media_key(
    stored_key: Option<&str>,
    locator: Option<&str>,
    bucket: &str,
    externally_hosted: bool,
) -> Option<String> {
    if externally_hosted {
        return None;
    }

    if let Some(key) = stored_key.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.trim_start_matches('/').to_string());
    }

    locator.and_then(|l| blob_key_from_locator(l, bucket))
}

/// Parse a media locator into a blob key within `bucket`.
///
/// Returns `None` for empty locators and for URLs from which no key can be
/// recovered.
#[must_use]
pub fn blob_key_from_locator(locator: &str, bucket: &str) -> Option<String> {
    let locator = locator.trim();
    if locator.is_empty() {
        return None;
    }

    if !scheme_re().is_match(locator) {
        return non_empty(locator.trim_start_matches('/'));
    }

    match Url::parse(locator) {
        Ok(url) => key_from_path(url.path(), bucket),
        Err(e) => {
            tracing::debug!(locator, error = %e, "Locator is not a valid URL, trying path tail");
            tail_segments_re()
                .captures(locator)
                .and_then(|caps| caps.get(1))
                .and_then(|m| decode(m.as_str()))
        }
    }
}

/// Turn a URL path into a key: strip the leading separator and bucket name.
fn key_from_path(path: &str, bucket: &str) -> Option<String> {
    let path = path.trim_start_matches('/');
    let path = if bucket.is_empty() {
        path
    } else {
        path.strip_prefix(bucket)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    };
    decode(path)
}

fn decode(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned());
    non_empty(&decoded)
}

fn non_empty(key: &str) -> Option<String> {
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}
