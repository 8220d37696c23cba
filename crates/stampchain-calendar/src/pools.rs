//! Calendar pool lists.
//!
//! A pool list is a JSON document naming the calendar servers to use:
//!
//! ```json
//! { "default_pools": ["https://a.pool.example/", "https://b.pool.example"] }
//! ```
//!
//! Trailing slashes are stripped so endpoints can be joined with paths.

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

/// Calendar used when no pool list is given.
pub const DEFAULT_CALENDAR: &str = "https://a.pool.opentimestamps.org";

/// Parsed pool list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub default_pools: Vec<String>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_pools: vec![DEFAULT_CALENDAR.to_string()],
        }
    }
}

impl PoolConfig {
    /// Parse a pool list document.
    ///
    /// Blank entries are dropped. A document with no usable endpoint is an
    /// error.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: PoolConfig =
            serde_json::from_str(json).map_err(|e| CalendarError::Config(e.to_string()))?;
        let config = Self::from_endpoints(raw.default_pools);
        if config.default_pools.is_empty() {
            return Err(CalendarError::Config("no default_pools entries".into()));
        }
        Ok(config)
    }

    /// Build from a list of URLs, normalizing each.
    pub fn from_endpoints<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let default_pools = endpoints
            .into_iter()
            .map(|url| normalize_endpoint(url.as_ref()))
            .filter(|url| !url.is_empty())
            .collect();
        Self { default_pools }
    }

    pub fn endpoints(&self) -> &[String] {
        &self.default_pools
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CalendarError::Config(e.to_string()))
    }
}

/// Trim whitespace and trailing slashes.
pub fn normalize_endpoint(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
