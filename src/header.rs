//! The `Cookie` header codec.
//!
//! Splits a raw header value into a name → value mapping, percent-decoding
//! names and values along the way. Malformed fragments are skipped, never
//! fatal; the only error this codec can produce is a percent-decoded byte
//! sequence that is not valid UTF-8.
use anyhow::Context;
use percent_encoding::percent_decode;
use std::borrow::Cow;
use std::collections::HashMap;

/// Parses a `Cookie` header value into a name → value mapping.
///
/// - Fragments without a `=` separator, or with an empty name, are skipped.
/// - Names and values are trimmed and percent-decoded.
/// - When the same name appears more than once, the first occurrence wins.
/// - An empty header yields an empty mapping.
pub(crate) fn parse(header: &str) -> Result<HashMap<String, String>, DecodingError> {
    let mut cookies = HashMap::new();
    for fragment in header.split(';') {
        let Some((name, value)) = fragment.split_once('=') else {
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.is_empty() {
            continue;
        }

        let name = decode(name)?;
        if cookies.contains_key(name.as_ref()) {
            continue;
        }
        let value = decode(value)?;
        cookies.insert(name.into_owned(), value.into_owned());
    }
    Ok(cookies)
}

fn decode(raw: &str) -> Result<Cow<'_, str>, DecodingError> {
    percent_decode(raw.as_bytes())
        .decode_utf8()
        .with_context(|| format!("Failed to percent-decode the cookie fragment `{raw}`"))
        .map_err(|source| DecodingError {
            raw_value: raw.to_string(),
            source,
        })
}

#[derive(Debug, thiserror::Error)]
#[error("{source}")]
/// An error that occurred while decoding a percent-encoded cookie name or value.
pub struct DecodingError {
    pub(crate) raw_value: String,
    #[source]
    pub(crate) source: anyhow::Error,
}

impl DecodingError {
    /// The fragment that failed to decode, as it appeared on the wire.
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }
}
