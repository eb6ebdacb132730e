//! Control parameters: the fields the relay consumes instead of forwarding.

use url::Url;

use crate::error::{Error, Result};
use crate::params::ParamMap;

pub const FORWARD_URL: &str = "forward_url";
pub const API_KEY: &str = "api_key";

/// Forward target and API key pulled from an inbound request, as raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlParams {
    pub forward_url: Vec<u8>,
    pub api_key: Vec<u8>,
}

impl ControlParams {
    /// Look up both control values across `sources`, earliest source first.
    ///
    /// Each key takes the first value of the earliest source where that value
    /// is non-empty. Either key without such a value is rejected.
    pub fn extract(sources: &[&ParamMap]) -> Result<Self> {
        let lookup = |key: &str| {
            sources
                .iter()
                .filter_map(|source| source.first(key))
                .find(|value| !value.is_empty())
                .map(<[u8]>::to_vec)
        };

        match (lookup(FORWARD_URL), lookup(API_KEY)) {
            (Some(forward_url), Some(api_key)) => Ok(Self { forward_url, api_key }),
            _ => Err(Error::MissingControl),
        }
    }

    /// Drop both control keys so only payload remains
    pub fn strip(params: &mut ParamMap) {
        params.remove(FORWARD_URL);
        params.remove(API_KEY);
    }

    /// `forward_url` for log lines
    pub fn forward_url_lossy(&self) -> String {
        String::from_utf8_lossy(&self.forward_url).into_owned()
    }

    /// Parse `forward_url` as an absolute http(s) URL
    pub fn target(&self) -> Result<Url> {
        let raw = std::str::from_utf8(&self.forward_url).map_err(|_| Error::InvalidForwardUrl)?;
        let url = Url::parse(raw).map_err(|_| Error::InvalidForwardUrl)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(Error::InvalidForwardUrl),
        }
    }
}
