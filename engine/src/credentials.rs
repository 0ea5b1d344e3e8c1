//! Search engine credentials and their precedence rules.
//!
//! Credentials come from two places: static configuration and the persisted
//! store. Each field is resolved on its own, and a statically configured
//! field always wins and is read-only.

use serde::{Deserialize, Serialize};

/// Host URL and API key, either of which may be unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            api_key: Some(api_key.into()),
        }
    }
}

/// Effective credentials, as reported to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCredentials {
    pub host: String,
    pub api_key: String,
    /// The host comes from static configuration and cannot be changed
    pub config_host: bool,
    /// The API key comes from static configuration and cannot be changed
    pub config_api_key: bool,
}

impl ResolvedCredentials {
    /// Resolve `static_config` over `stored`, field by field.
    pub fn resolve(static_config: &Credentials, stored: &Credentials) -> Self {
        let (host, config_host) = pick(&static_config.host, &stored.host);
        let (api_key, config_api_key) = pick(&static_config.api_key, &stored.api_key);
        Self {
            host,
            api_key,
            config_host,
            config_api_key,
        }
    }

    pub fn has_host(&self) -> bool {
        !self.host.is_empty()
    }

    /// Apply an update to the `stored` credentials, dropping every field
    /// that static configuration owns.
    pub fn writable_update(static_config: &Credentials, update: Credentials) -> Credentials {
        Credentials {
            host: update.host.filter(|_| static_config.host.is_none()),
            api_key: update.api_key.filter(|_| static_config.api_key.is_none()),
        }
    }
}

fn pick(static_value: &Option<String>, stored: &Option<String>) -> (String, bool) {
    match static_value {
        Some(value) => (value.clone(), true),
        None => (stored.clone().unwrap_or_default(), false),
    }
}
