//! Runtime configuration read from the environment.
//!
//! Variables may also come from a `.env` file; `main` loads it before calling
//! [`Config::from_env`].

use crate::issuer::DEFAULT_TOKEN_URI;
use std::{env, path::PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://androidmanagement.googleapis.com/v1";

pub const BASE_URL_VAR: &str = "AMAPI_BASE_URL";
pub const TOKEN_URI_VAR: &str = "AMAPI_TOKEN_URI";
pub const CACHE_DIR_VAR: &str = "AMAPI_CACHE_DIR";

#[derive(Debug, Clone)]
pub struct Config {
    /// Every API path is resolved below this URL
    pub base_url: Url,
    pub token_uri: String,
    /// Directory holding the application namespace directory
    pub cache_root: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let base_url = Url::parse(&base_url).map_err(|source| ConfigError::InvalidBaseUrl {
            value: base_url,
            source,
        })?;

        let token_uri = lookup(TOKEN_URI_VAR).unwrap_or_else(|| DEFAULT_TOKEN_URI.into());

        let cache_root = match lookup(CACHE_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?,
        };

        Ok(Self {
            base_url,
            token_uri,
            cache_root,
        })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("AMAPI_BASE_URL is not a valid URL ({value}): {source}")]
    InvalidBaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Cannot find home directory; set AMAPI_CACHE_DIR")]
    NoHomeDirectory,
}
