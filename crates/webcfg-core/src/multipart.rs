//! # Multipart Wire Codec
//!
//! Carries several named byte payloads in one HTTP body using
//! `multipart/mixed` framing:
//!
//! ```text
//! --{boundary}\r\n
//! Content-Type: application/msgpack\r\n
//! Namespace: lan\r\n
//! Etag: 3f1c0a9e5d2b7c41\r\n
//! Content-Length: 1234\r\n
//! \r\n
//! {1234 raw bytes}\r\n
//! --{boundary}--\r\n
//! ```
//!
//! ## Binary Safety
//!
//! Payloads are written verbatim, never escaped or re-encoded, and may be
//! arbitrary non-UTF-8 bytes. Every part carries `Content-Length`, which
//! the decoder trusts over delimiter scanning. The encoder additionally
//! picks a boundary that appears in no payload, so a body stays parseable
//! by decoders that only scan for delimiters.

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::CodecError;
use crate::version::Version;

/// Media type of an encoded body, without parameters.
pub const MULTIPART_MIXED: &str = "multipart/mixed";

/// Default media type of a subdocument part.
pub const APPLICATION_MSGPACK: &str = "application/msgpack";

const HEADER_CONTENT_TYPE: &str = "Content-Type";
const HEADER_NAMESPACE: &str = "Namespace";
const HEADER_ETAG: &str = "Etag";
const HEADER_CONTENT_LENGTH: &str = "Content-Length";

const CRLF: &[u8] = b"\r\n";
const BOUNDARY_ATTEMPTS: usize = 8;

/// One named payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    /// Logical name, normally the subdocument id.
    pub name: String,
    /// Media type of `bytes`.
    pub content_type: String,
    /// Version token of this payload.
    pub version: Version,
    /// Raw payload.
    pub bytes: Vec<u8>,
}

impl Part {
    /// A part with the default msgpack content type.
    pub fn new(name: impl Into<String>, version: Version, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: APPLICATION_MSGPACK.to_string(),
            version,
            bytes,
        }
    }

    /// Override the media type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// An encoded multipart body together with its boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Multipart {
    boundary: String,
    body: Vec<u8>,
}

impl Multipart {
    /// Value for the HTTP `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("{MULTIPART_MIXED}; boundary={}", self.boundary)
    }

    /// The boundary string.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// The encoded body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Take ownership of the encoded body.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Encode `parts` in order under a freshly chosen boundary.
pub fn encode(parts: &[Part]) -> Result<Multipart, CodecError> {
    for _ in 0..BOUNDARY_ATTEMPTS {
        let boundary = format!("webcfg-{}", Uuid::new_v4().simple());
        if boundary_is_free(parts, &boundary) {
            return encode_with_boundary(parts, &boundary);
        }
    }
    Err(CodecError::BoundaryExhausted)
}

/// Encode `parts` under a caller-chosen boundary.
///
/// Fails with `BoundaryExhausted` when the boundary occurs in a payload.
pub fn encode_with_boundary(parts: &[Part], boundary: &str) -> Result<Multipart, CodecError> {
    if boundary.is_empty() || !boundary_is_free(parts, boundary) {
        return Err(CodecError::BoundaryExhausted);
    }
    let delimiter = format!("--{boundary}");
    let payload_len: usize = parts.iter().map(|p| p.bytes.len() + 256).sum();
    let mut body = Vec::with_capacity(payload_len + delimiter.len() + 8);

    for part in parts {
        body.extend_from_slice(delimiter.as_bytes());
        body.extend_from_slice(CRLF);
        push_header(&mut body, HEADER_CONTENT_TYPE, &part.content_type);
        push_header(&mut body, HEADER_NAMESPACE, &part.name);
        push_header(&mut body, HEADER_ETAG, part.version.as_str());
        push_header(&mut body, HEADER_CONTENT_LENGTH, &part.bytes.len().to_string());
        body.extend_from_slice(CRLF);
        body.extend_from_slice(&part.bytes);
        body.extend_from_slice(CRLF);
    }
    body.extend_from_slice(delimiter.as_bytes());
    body.extend_from_slice(b"--");
    body.extend_from_slice(CRLF);

    Ok(Multipart {
        boundary: boundary.to_string(),
        body,
    })
}

/// Decode a body produced by [`encode`] (or any compatible writer).
///
/// `content_type` is the HTTP `Content-Type` header value. Parts are keyed
/// by name; a repeated name keeps the last occurrence.
pub fn decode(content_type: &str, body: &[u8]) -> Result<HashMap<String, Part>, CodecError> {
    let boundary = boundary_from_content_type(content_type)
        .ok_or_else(|| CodecError::MissingBoundary(content_type.to_string()))?;
    let delimiter = format!("--{boundary}").into_bytes();
    let mut body_delimiter = CRLF.to_vec();
    body_delimiter.extend_from_slice(&delimiter);

    let mut pos = find(body, &delimiter, 0)
        .ok_or_else(|| CodecError::Malformed("opening delimiter not found".into()))?;
    let mut parts = HashMap::new();
    let mut index = 0usize;

    loop {
        pos += delimiter.len();
        if body[pos..].starts_with(b"--") {
            break;
        }
        if !body[pos..].starts_with(CRLF) {
            return Err(CodecError::Malformed(format!(
                "expected line break after delimiter at offset {pos}"
            )));
        }
        pos += CRLF.len();

        // A part with no headers starts its content right after a blank line.
        let header_end = if body[pos..].starts_with(CRLF) {
            pos - CRLF.len()
        } else {
            find(body, b"\r\n\r\n", pos).ok_or_else(|| {
                CodecError::Malformed(format!("unterminated headers in part {index}"))
            })?
        };
        let headers = parse_headers(&body[pos..header_end.max(pos)])?;
        let content_start = header_end + 4;
        if content_start > body.len() {
            return Err(CodecError::Malformed(format!("truncated part {index}")));
        }

        let content_end = match headers.get(&HEADER_CONTENT_LENGTH.to_ascii_lowercase()) {
            Some(len) => {
                let len: usize = len.parse().map_err(|_| {
                    CodecError::Malformed(format!("bad Content-Length {len:?} in part {index}"))
                })?;
                let end = content_start
                    .checked_add(len)
                    .filter(|end| *end <= body.len())
                    .ok_or_else(|| CodecError::Malformed(format!("truncated part {index}")))?;
                if !body[end..].starts_with(&body_delimiter) {
                    return Err(CodecError::Malformed(format!(
                        "Content-Length of part {index} does not reach the next delimiter"
                    )));
                }
                end
            }
            None => find(body, &body_delimiter, content_start).ok_or_else(|| {
                CodecError::Malformed(format!("closing delimiter not found for part {index}"))
            })?,
        };

        let name = headers
            .get(&HEADER_NAMESPACE.to_ascii_lowercase())
            .cloned()
            .ok_or(CodecError::UnnamedPart(index))?;
        let part = Part {
            name: name.clone(),
            content_type: headers
                .get(&HEADER_CONTENT_TYPE.to_ascii_lowercase())
                .cloned()
                .unwrap_or_else(|| APPLICATION_MSGPACK.to_string()),
            version: Version::new(
                headers
                    .get(&HEADER_ETAG.to_ascii_lowercase())
                    .cloned()
                    .unwrap_or_default(),
            ),
            bytes: body[content_start..content_end].to_vec(),
        };
        parts.insert(name, part);

        index += 1;
        pos = content_end + CRLF.len();
    }

    Ok(parts)
}

/// Extract the `boundary` parameter from a `Content-Type` value.
pub fn boundary_from_content_type(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("boundary") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then_some(value)
    })
}

fn boundary_is_free(parts: &[Part], boundary: &str) -> bool {
    let needle = format!("--{boundary}");
    parts
        .iter()
        .all(|p| find(&p.bytes, needle.as_bytes(), 0).is_none())
}

fn push_header(body: &mut Vec<u8>, name: &str, value: &str) {
    body.extend_from_slice(name.as_bytes());
    body.extend_from_slice(b": ");
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(CRLF);
}

/// Header names are lowercased; values are trimmed.
fn parse_headers(block: &[u8]) -> Result<HashMap<String, String>, CodecError> {
    let text = std::str::from_utf8(block)
        .map_err(|_| CodecError::Malformed("part headers are not UTF-8".into()))?;
    let mut headers = HashMap::new();
    for line in text.split("\r\n").filter(|l| !l.is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| CodecError::Malformed(format!("bad header line {line:?}")))?;
        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
    }
    Ok(headers)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
