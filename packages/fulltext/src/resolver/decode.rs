//! Direct decoding of redirect identifiers (strategy 2).
//!
//! Old-scheme identifiers are URL-safe base64 wrapping a small binary
//! envelope: a three-byte preamble, a length-prefixed target URL, and a
//! trailing section introduced by a fixed two-byte suffix. New-scheme
//! identifiers carry a versioned marker instead of a URL and can only be
//! resolved through the challenge-response API.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Envelope preamble on decoded payloads.
const PAYLOAD_PREFIX: &[u8] = b"\x08\x13\x22";

/// Introduces the trailing section after the embedded URL.
const PAYLOAD_SUFFIX: &[u8] = b"\xd2\x01";

/// Versioned marker of the new encoding scheme.
const NEW_FORMAT_MARKER: &[u8] = b"AU_yqL";

/// What an identifier decoded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DecodedPayload {
    /// Old scheme: the target URL was embedded directly
    Url(String),
    /// New scheme: resolution requires the challenge-response API
    NewFormat,
}

/// Decode one article identifier, or explain why it would not decode.
pub(crate) fn decode_article_id(id: &str) -> Result<DecodedPayload, String> {
    if id.is_empty() {
        return Err("empty identifier segment".to_string());
    }

    // URL-safe alphabet to standard, then pad out to a multiple of four.
    let mut normalized = id.replace('-', "+").replace('_', "/");
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    let decoded = STANDARD
        .decode(normalized.as_bytes())
        .map_err(|e| format!("base64 decode: {e}"))?;

    let mut body: &[u8] = &decoded;
    if body.starts_with(PAYLOAD_PREFIX) {
        body = &body[PAYLOAD_PREFIX.len()..];
    }
    if let Some(pos) = find_subslice(body, PAYLOAD_SUFFIX) {
        body = &body[..pos];
    }

    // The embedded string sits behind one or two length bytes; the marker,
    // when present, starts it.
    if find_subslice(body, NEW_FORMAT_MARKER).is_some_and(|i| i <= 2) {
        return Ok(DecodedPayload::NewFormat);
    }

    let text = String::from_utf8_lossy(body);
    let url_pattern = regex::Regex::new(r#"https?://[^\x00-\x20"\\\x{FFFD}]+"#).unwrap();
    match url_pattern.find(&text) {
        Some(m) => Ok(DecodedPayload::Url(trim_trailing_junk(m.as_str()))),
        None => Err("no absolute URL in decoded payload".to_string()),
    }
}

fn trim_trailing_junk(s: &str) -> String {
    s.trim_end_matches(|c: char| c.is_control() || c == '\u{FFFD}')
        .to_string()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    fn encode_payload(body: &[u8]) -> String {
        let mut payload = Vec::new();
        payload.extend_from_slice(PAYLOAD_PREFIX);
        payload.extend_from_slice(body);
        URL_SAFE_NO_PAD.encode(payload)
    }

    #[test]
    fn decodes_embedded_url() {
        let mut body = vec![0x22u8]; // length byte ahead of the string
        body.extend_from_slice(b"https://example.com/news/story-1");
        body.extend_from_slice(PAYLOAD_SUFFIX);
        body.extend_from_slice(b"\x00\x01junk");

        let id = encode_payload(&body);
        let decoded = decode_article_id(&id).unwrap();
        assert_eq!(
            decoded,
            DecodedPayload::Url("https://example.com/news/story-1".to_string())
        );
    }

    #[test]
    fn flags_new_format_marker() {
        let mut body = vec![0x41u8]; // length byte
        body.extend_from_slice(b"AU_yqLNtc3kAb12");
        let id = encode_payload(&body);
        assert_eq!(decode_article_id(&id).unwrap(), DecodedPayload::NewFormat);
    }

    #[test]
    fn marker_inside_a_url_is_not_new_format() {
        let mut body = vec![0x30u8];
        body.extend_from_slice(b"https://example.com/AU_yqL/page");
        let id = encode_payload(&body);
        assert!(matches!(
            decode_article_id(&id).unwrap(),
            DecodedPayload::Url(_)
        ));
    }

    #[test]
    fn rejects_payload_without_url() {
        let id = encode_payload(b"\x05hello");
        assert!(decode_article_id(&id).is_err());
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(decode_article_id("!!!not-base64!!!").is_err());
        assert!(decode_article_id("").is_err());
    }

    #[test]
    fn trims_trailing_control_bytes() {
        let mut body = vec![0x20u8];
        body.extend_from_slice(b"https://example.com/a\x01\x02");
        let id = encode_payload(&body);
        assert_eq!(
            decode_article_id(&id).unwrap(),
            DecodedPayload::Url("https://example.com/a".to_string())
        );
    }
}
