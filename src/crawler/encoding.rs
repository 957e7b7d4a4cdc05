//! Response body decoding
//!
//! Older forum software frequently serves GBK/GB2312 pages without a charset
//! in the `Content-Type` header. Detection order:
//!
//! 1. `charset=` parameter of the `Content-Type` header
//! 2. `<meta charset>` / `<meta http-equiv="Content-Type">` in the first 2 KiB
//! 3. UTF-8, if the bytes are valid UTF-8
//! 4. The configured fallback encoding
//!
//! Decoding is lossy and never fails.

use encoding_rs::{Encoding, GBK, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// How far into the document `<meta>` declarations are searched for
const SNIFF_LIMIT: usize = 2048;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?\s*([a-z0-9_\-:.]+)"#)
        .expect("valid meta charset regex")
});

/// Resolves an encoding label, falling back to GBK when the label is unknown
pub fn encoding_for_label(label: &str) -> &'static Encoding {
    Encoding::for_label(label.trim().as_bytes()).unwrap_or(GBK)
}

/// Extracts the charset parameter from a Content-Type header value
fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| Encoding::for_label(value.trim().trim_matches('"').as_bytes()))
}

/// Looks for a charset declaration in the document head
fn charset_from_meta(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(SNIFF_LIMIT)];
    let caps = META_CHARSET.captures(head)?;
    Encoding::for_label(caps.get(1)?.as_bytes())
}

/// Detects the encoding of a response body
///
/// # Arguments
///
/// * `body` - Raw response bytes
/// * `content_type` - The `Content-Type` header value, if any
/// * `fallback` - Encoding used when nothing else applies
pub fn detect_encoding(
    body: &[u8],
    content_type: Option<&str>,
    fallback: &'static Encoding,
) -> &'static Encoding {
    if let Some(encoding) = content_type.and_then(charset_from_content_type) {
        return encoding;
    }

    if let Some(encoding) = charset_from_meta(body) {
        return encoding;
    }

    if std::str::from_utf8(body).is_ok() {
        return UTF_8;
    }

    fallback
}

/// Decodes a response body to text
pub fn decode_body(body: &[u8], content_type: Option<&str>, fallback: &'static Encoding) -> String {
    let encoding = detect_encoding(body, content_type, fallback);
    let (text, actual, had_errors) = encoding.decode(body);

    if had_errors {
        tracing::debug!(
            "Body decoded as {} with replacement characters",
            actual.name()
        );
    }

    text.into_owned()
}
