//! Multi-valued parameter maps for query strings and form bodies.
//!
//! Names and values are kept as raw decoded bytes so that payloads in any
//! charset survive a decode/encode round trip untouched.

use std::borrow::Cow;
use std::collections::BTreeMap;

use percent_encoding::percent_decode;
use url::form_urlencoded;

use crate::error::{Error, Result};

/// Placeholder written in place of secret values
pub const REDACTED: &str = "REDACTED";

/// Query or form parameters: key -> values in arrival order.
///
/// Keys are kept sorted so that `encode()` is deterministic. Only the order of
/// values within a key carries meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: BTreeMap<Vec<u8>, Vec<Vec<u8>>>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string. Pairs with a malformed `%` escape are dropped.
    pub fn parse_query(query: &str) -> Self {
        let mut map = Self::new();
        for (key, value) in split_pairs(query.as_bytes()) {
            if let (Ok(key), Ok(value)) = (unescape(key), unescape(value)) {
                map.append(key, value);
            }
        }
        map
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// Any malformed `%` escape fails the whole body.
    pub fn parse_form(body: &[u8]) -> Result<Self> {
        let mut map = Self::new();
        for (key, value) in split_pairs(body) {
            map.append(unescape(key)?, unescape(value)?);
        }
        Ok(map)
    }

    /// First value for `key`, if any
    pub fn first(&self, key: &str) -> Option<&[u8]> {
        self.entries
            .get(key.as_bytes())
            .and_then(|values| values.first())
            .map(Vec::as_slice)
    }

    pub fn get_all(&self, key: &str) -> &[Vec<u8>] {
        self.entries
            .get(key.as_bytes())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key.as_bytes())
    }

    pub fn append(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.entry(key.into()).or_default().push(value.into());
    }

    /// Remove every value stored under `key`
    pub fn remove(&mut self, key: &str) -> Option<Vec<Vec<u8>>> {
        self.entries.remove(key.as_bytes())
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &[u8])> {
        self.entries.iter().flat_map(|(k, values)| {
            values.iter().map(move |v| (k.as_slice(), v.as_slice()))
        })
    }

    /// Form-encode every pair, keys sorted, values in arrival order
    pub fn encode(&self) -> String {
        self.iter()
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    form_urlencoded::byte_serialize(k).collect::<String>(),
                    form_urlencoded::byte_serialize(v).collect::<String>()
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Render as `k=v1,v2&k2=v` for log lines
    pub fn summary(&self) -> String {
        self.entries
            .iter()
            .map(|(k, values)| {
                let values: Vec<Cow<'_, str>> =
                    values.iter().map(|v| String::from_utf8_lossy(v)).collect();
                format!("{}={}", String::from_utf8_lossy(k), values.join(","))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Copy with every value of `key` replaced by [`REDACTED`]
    pub fn redacted(&self, key: &str) -> Self {
        let mut copy = self.clone();
        if let Some(values) = copy.entries.get_mut(key.as_bytes()) {
            values.iter_mut().for_each(|v| *v = REDACTED.into());
        }
        copy
    }
}

impl<K: Into<Vec<u8>>, V: Into<Vec<u8>>> FromIterator<(K, V)> for ParamMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.append(k, v);
        }
        map
    }
}

/// Split `a=1&b&&c=` into raw (key, value) pairs, skipping empty segments
fn split_pairs(raw: &[u8]) -> impl Iterator<Item = (&[u8], &[u8])> {
    raw.split(|&b| b == b'&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.iter().position(|&b| b == b'=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => (pair, &[][..]),
        })
}

/// Decode one component: `+` is a space, every `%` must start a hex pair
fn unescape(raw: &[u8]) -> Result<Vec<u8>> {
    let mut rest = raw;
    while let Some(at) = rest.iter().position(|&b| b == b'%') {
        let escape = &rest[at..(at + 3).min(rest.len())];
        if escape.len() < 3 || !escape[1..].iter().all(u8::is_ascii_hexdigit) {
            return Err(Error::InvalidForm(format!(
                "invalid URL escape {:?}",
                String::from_utf8_lossy(escape)
            )));
        }
        rest = &rest[at + 3..];
    }

    let spaced: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    Ok(percent_decode(&spaced).collect())
}
