//! Utility functions shared across the adapter.
//!
//! URI component coding, case-insensitive header lookup and the "present and
//! non-empty" checks gateway payloads need.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::HashMap;

/// Characters left untouched by URI component encoding.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-decodes a query key or value.
///
/// `+` is not treated as a space. Input that does not decode to valid UTF-8
/// is returned unchanged.
#[must_use]
pub fn decode_uri_component(input: &str) -> String {
    urlencoding::decode(input).map_or_else(|_| input.to_string(), |decoded| decoded.into_owned())
}

/// Percent-encodes everything except the unreserved URI component characters.
#[must_use]
pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// Finds a header by name, ignoring ASCII case.
#[must_use]
#[allow(clippy::implicit_hasher)]
pub fn find_header<'a, V>(headers: &'a HashMap<String, V>, name: &str) -> Option<&'a V> {
    headers
        .get(name)
        .or_else(|| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
}

/// Removes every header matching `name`, ignoring ASCII case.
#[allow(clippy::implicit_hasher)]
pub fn remove_header<V>(headers: &mut HashMap<String, V>, name: &str) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
}

/// Returns the string when it is present and non-empty.
#[must_use]
pub fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}
