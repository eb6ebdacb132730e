//! Request/Response Header Rewriting
//!
//! Builds the outbound header set from the inbound one and copies the
//! target's response headers back without merging multi-value entries.

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST, TRAILER, TRANSFER_ENCODING};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use flyt_shared::{Error, Result};

use crate::handler::PayloadStrategy;

/// Header carrying the API key to the target
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-flyt-api-key");

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Framing headers owned by whichever connection writes the message
const CONNECTION_MANAGED: [HeaderName; 4] = [HOST, CONTENT_LENGTH, TRANSFER_ENCODING, TRAILER];

/// Rewrite request headers before forwarding to the target
pub fn outbound_headers(
    inbound: &HeaderMap,
    api_key: &[u8],
    strategy: PayloadStrategy,
) -> Result<HeaderMap> {
    let mut headers = inbound.clone();
    for name in &CONNECTION_MANAGED {
        headers.remove(name);
    }

    let key = HeaderValue::from_bytes(api_key).map_err(|_| Error::InvalidApiKey)?;
    headers.insert(API_KEY_HEADER, key);

    if strategy == PayloadStrategy::FormBody {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
    }

    Ok(headers)
}

/// Append every upstream header value to the downstream response
pub fn relay_response_headers(upstream: &HeaderMap, downstream: &mut HeaderMap) {
    for (name, value) in upstream {
        if *name == TRANSFER_ENCODING {
            continue;
        }
        downstream.append(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;

    fn inbound() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(HOST, HeaderValue::from_static("relay.local:8080"));
        h.insert(CONTENT_LENGTH, HeaderValue::from_static("42"));
        h.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        h.insert("x-custom", HeaderValue::from_static("keep"));
        h.append("accept", HeaderValue::from_static("text/html"));
        h.append("accept", HeaderValue::from_static("application/json"));
        h
    }

    #[test]
    fn test_copies_and_injects_api_key() {
        let h = outbound_headers(&inbound(), b"K", PayloadStrategy::QueryString).unwrap();
        assert_eq!(h.get(&API_KEY_HEADER).unwrap(), "K");
        assert_eq!(h.get("x-custom").unwrap(), "keep");
        assert_eq!(h.get_all("accept").iter().count(), 2);
        assert_eq!(h.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert!(h.get(HOST).is_none());
        assert!(h.get(CONTENT_LENGTH).is_none());
    }

    #[test]
    fn test_api_key_overwrites_existing() {
        let mut h = inbound();
        h.append(API_KEY_HEADER, HeaderValue::from_static("old-1"));
        h.append(API_KEY_HEADER, HeaderValue::from_static("old-2"));
        let h = outbound_headers(&h, b"new", PayloadStrategy::QueryString).unwrap();
        let keys: Vec<_> = h.get_all(&API_KEY_HEADER).iter().collect();
        assert_eq!(keys, vec!["new"]);
    }

    #[test]
    fn test_form_forces_content_type() {
        let h = outbound_headers(&inbound(), b"K", PayloadStrategy::FormBody).unwrap();
        assert_eq!(h.get(CONTENT_TYPE).unwrap(), FORM_CONTENT_TYPE);
    }

    #[test]
    fn test_rejects_unencodable_api_key() {
        let err = outbound_headers(&HeaderMap::new(), b"bad\nkey", PayloadStrategy::QueryString).unwrap_err();
        assert!(matches!(err, Error::InvalidApiKey));
    }

    #[test]
    fn test_non_ascii_api_key_passes_through() {
        let key = "clé-ü".as_bytes();
        let h = outbound_headers(&HeaderMap::new(), key, PayloadStrategy::QueryString).unwrap();
        assert_eq!(h.get(&API_KEY_HEADER).unwrap().as_bytes(), key);

        let latin1 = [b'k', 0xE9, b'y'];
        let h = outbound_headers(&HeaderMap::new(), &latin1, PayloadStrategy::QueryString).unwrap();
        assert_eq!(h.get(&API_KEY_HEADER).unwrap().as_bytes(), &latin1);
    }

    #[test]
    fn test_response_multi_values_stay_separate() {
        let mut upstream = HeaderMap::new();
        upstream.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        upstream.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        upstream.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        upstream.insert("x-upstream", HeaderValue::from_static("yes"));

        let mut downstream = HeaderMap::new();
        relay_response_headers(&upstream, &mut downstream);

        let cookies: Vec<_> = downstream.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(downstream.get("x-upstream").unwrap(), "yes");
        assert!(downstream.get(TRANSFER_ENCODING).is_none());
    }
}
