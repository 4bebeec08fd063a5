use crate::error::*;
use std::collections::BTreeMap;

/// Default limit on the length of headers and URLs that are pattern-matched.
pub const MAX_MATCH_LENGTH: usize = 4096;

/// The attributes of a parsed Hawk header, keyed by attribute name.
pub type Attributes = BTreeMap<String, String>;

/// Attribute names that may appear in a request `Authorization` header.
pub const AUTHORIZATION_KEYS: &[&str] = &["id", "ts", "nonce", "hash", "ext", "mac", "app", "dlg"];

const ATTRIBUTE_PUNCTUATION: &[u8] = b" !#$%&'()*+,-./:;<=>?@[]^`{|}~";

fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn is_space(b: u8) -> bool {
    // \s in a PCRE character class
    b == b' ' || b == b'\t' || b == b'\n' || b == b'\r' || b == 0x0b || b == 0x0c
}

fn is_attribute_char(b: u8) -> bool {
    is_word(b) || ATTRIBUTE_PUNCTUATION.contains(&b)
}

/// Parse a `Hawk ...` header value into its attributes, allowing only `keys`.
///
/// A missing header or a non-Hawk scheme is `Unauthorized` with an empty message, so the caller
/// can try another scheme; anything malformed is `BadRequest`.
pub fn parse_authorization_header(header: &str, keys: &[&str]) -> ServerResult<Attributes> {
    parse_authorization_header_with_limit(header, keys, MAX_MATCH_LENGTH)
}

/// As [`parse_authorization_header`], rejecting headers longer than `max_length` bytes.
pub fn parse_authorization_header_with_limit(
    header: &str,
    keys: &[&str],
    max_length: usize,
) -> ServerResult<Attributes> {
    if header.is_empty() {
        return Err(ServerError::unauthorized(""));
    }

    if header.len() > max_length {
        return Err(ServerError::bad_request("Header length too long"));
    }

    let (scheme, attributes) = split_scheme(header)?;

    if !scheme.eq_ignore_ascii_case("hawk") {
        return Err(ServerError::unauthorized(""));
    }

    if attributes.is_empty() {
        return Err(ServerError::bad_request("Invalid header syntax"));
    }

    parse_attributes(attributes, keys)
}

/// Split `<scheme>[ <attributes>]`.
fn split_scheme(header: &str) -> ServerResult<(&str, &str)> {
    let bytes = header.as_bytes();
    let scheme_end = bytes.iter().position(|b| !is_word(*b)).unwrap_or(bytes.len());
    if scheme_end == 0 {
        return Err(ServerError::bad_request("Invalid header syntax"));
    }
    if scheme_end == bytes.len() {
        return Ok((header, ""));
    }

    let rest_start = bytes[scheme_end..]
        .iter()
        .position(|b| !is_space(*b))
        .map(|p| scheme_end + p)
        .unwrap_or(bytes.len());
    if rest_start == scheme_end {
        return Err(ServerError::bad_request("Invalid header syntax"));
    }

    let rest = &header[rest_start..];
    if rest.contains('\n') {
        return Err(ServerError::bad_request("Invalid header syntax"));
    }

    Ok((&header[..scheme_end], rest))
}

/// Find every `key="value"` pair, in order.  Text between pairs that is not part of any pair
/// makes the whole header malformed.
fn parse_attributes(input: &str, keys: &[&str]) -> ServerResult<Attributes> {
    let bytes = input.as_bytes();
    let mut attributes = Attributes::new();
    let mut unmatched = false;
    let mut pos = 0;

    while pos < bytes.len() {
        let (key, value, end) = match match_attribute(input, pos) {
            Some(m) => m,
            None => {
                unmatched = true;
                pos += 1;
                continue;
            }
        };

        if !keys.contains(&key) {
            return Err(ServerError::bad_request(format!(
                "Unknown attribute: {}",
                key
            )));
        }

        if value.is_empty() || !value.bytes().all(is_attribute_char) {
            return Err(ServerError::bad_request(format!(
                "Bad attribute value: {}",
                key
            )));
        }

        if attributes.contains_key(key) {
            return Err(ServerError::bad_request(format!(
                "Duplicate attribute: {}",
                key
            )));
        }

        attributes.insert(key.to_string(), value.to_string());
        pos = end;
    }

    if unmatched {
        return Err(ServerError::bad_request("Bad header format"));
    }

    Ok(attributes)
}

/// Match `\w+="[^"\\]*"\s*(,\s*|$)` at `start`, returning the key, the value and the end offset.
fn match_attribute(input: &str, start: usize) -> Option<(&str, &str, usize)> {
    let bytes = input.as_bytes();

    let mut pos = start;
    while pos < bytes.len() && is_word(bytes[pos]) {
        pos += 1;
    }
    if pos == start {
        return None;
    }
    let key_end = pos;

    if bytes.get(pos) != Some(&b'=') || bytes.get(pos + 1) != Some(&b'"') {
        return None;
    }
    pos += 2;
    let value_start = pos;

    loop {
        match bytes.get(pos) {
            Some(b'"') => break,
            Some(b'\\') | None => return None,
            Some(_) => pos += 1,
        }
    }
    let value_end = pos;
    pos += 1;

    while pos < bytes.len() && is_space(bytes[pos]) {
        pos += 1;
    }
    if pos < bytes.len() {
        if bytes[pos] != b',' {
            return None;
        }
        pos += 1;
        while pos < bytes.len() && is_space(bytes[pos]) {
            pos += 1;
        }
    }

    Some((
        &input[start..key_end],
        &input[value_start..value_end],
        pos,
    ))
}

/// Check that a value may be placed in a header attribute, and escape `"` and `\`.
pub fn escape_header_attribute(value: &str) -> ClientResult<String> {
    if !value
        .bytes()
        .all(|b| is_attribute_char(b) || b == b'"' || b == b'\\')
    {
        return Err(ClientError::InvalidArgument(format!(
            "Bad attribute value ({})",
            value
        )));
    }

    Ok(value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render `Hawk k1="v1", k2="v2"`.  Values must already be escaped.
pub(crate) fn format_header(attributes: &[(&str, &str)]) -> String {
    let parts: Vec<String> = attributes
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, v))
        .collect();
    format!("Hawk {}", parts.join(", "))
}
