//! Credentials for a Redmine instance.

use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;

pub const URL_VAR: &str = "REDMINE_URL";
pub const API_KEY_VAR: &str = "REDMINE_API_KEY";

/// Instance URL and API key, as supplied by the host's credential store.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub url: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
        }
    }

    /// Read `REDMINE_URL` and `REDMINE_API_KEY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup(URL_VAR).ok_or(ConfigError::MissingVar(URL_VAR))?;
        let api_key = lookup(API_KEY_VAR).ok_or(ConfigError::MissingVar(API_KEY_VAR))?;
        let credentials = Self::new(url, api_key);
        credentials.validate()?;
        Ok(credentials)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Empty("url"));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Empty("api key"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("api_key", &"[redacted]")
            .finish()
    }
}
