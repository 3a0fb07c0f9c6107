//! Conversions between scalar Rust values and their textual
//! token representation.

use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::{Error, Result};

/// Line length of MIME base64 output.
const MIME_LINE_LEN: usize = 76;

/// Encodes bytes in MIME flavored base64.
///
/// This is the standard alphabet with padding, broken into lines
/// of 76 characters separated by CRLF.
pub fn encode_bytes(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    if encoded.len() <= MIME_LINE_LEN {
        return encoded;
    }

    let mut out = String::with_capacity(encoded.len() + encoded.len() / MIME_LINE_LEN * 2);
    for (i, line) in encoded.as_bytes().chunks(MIME_LINE_LEN).enumerate() {
        if i != 0 {
            out.push_str("\r\n");
        }
        // base64 output is pure ASCII, so every chunk is valid UTF-8.
        out.extend(line.iter().map(|&b| b as char));
    }

    out
}

/// Decodes MIME flavored base64, ignoring any embedded whitespace.
pub fn decode_bytes(text: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    if text.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        STANDARD.decode(compact)
    } else {
        STANDARD.decode(text)
    }
}

/// Formats a timestamp in RFC 3339 form, using `Z` for a zero
/// offset and only as many fractional digits as needed.
pub fn format_timestamp(v: &DateTime<FixedOffset>) -> String {
    v.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses an RFC 3339 timestamp, keeping its offset.
pub fn parse_timestamp(text: &str) -> std::result::Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(text)
}

pub(crate) fn parse_number<T: FromStr>(field: &str, text: &str) -> Result<T> {
    text.parse().map_err(|_| Error::MalformedNumber {
        field: field.to_owned(),
        text: text.to_owned(),
    })
}

pub(crate) fn decode_field(field: &str, text: &str) -> Result<Vec<u8>> {
    decode_bytes(text).map_err(|source| Error::DecodingError {
        field: field.to_owned(),
        source,
    })
}

pub(crate) fn timestamp_field(field: &str, text: &str) -> Result<DateTime<FixedOffset>> {
    parse_timestamp(text).map_err(|source| Error::MalformedTimestamp {
        field: field.to_owned(),
        text: text.to_owned(),
        source,
    })
}
