//! Percent-decoding of request targets.
//!
//! Paths and query strings decode differently. `+` means a space only
//! inside a query string. A literal `+` in a path segment stays a `+`.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped in a query key or value. Everything but unreserved characters.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters escaped in a path. Same as a query component, but `/` separates segments.
const PATH: &AsciiSet = &QUERY_COMPONENT.remove(b'/');

/// Decode `%XX` escapes in a request path.
///
/// Malformed escapes are kept literally, and invalid UTF-8 becomes U+FFFD.
pub fn decode_path(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Decode a query-string key or value: `+` becomes a space, then `%XX` escapes are expanded.
pub fn decode_query_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Split a raw query string into decoded `(name, value)` pairs.
///
/// A bare `key` yields an empty value. When a name repeats, the last value wins
/// but the pair keeps the position of the first occurrence.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();

    for pair in query.split('&').filter(|s| !s.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let name = decode_query_component(name);
        let value = decode_query_component(value);

        match params.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => params.push((name, value)),
        }
    }

    params
}

pub(crate) fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}

pub(crate) fn encode_query_component(component: &str) -> String {
    utf8_percent_encode(component, QUERY_COMPONENT).to_string()
}
