//! Admin configuration.
//!
//! Listing page size and input bounds. Loaded from environment variables with
//! defaults matching the admin screens.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Settings shared by every admin service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminConfig {
    /// Records per listing page.
    pub page_size: u32,

    /// Maximum length of role names, user names and emails.
    pub name_max_len: usize,

    /// Minimum length of a new password.
    pub password_min_len: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            name_max_len: 255,
            password_min_len: 8,
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RBAC_PAGE_SIZE`: Records per listing page (default: 5)
    /// - `RBAC_NAME_MAX_LEN`: Maximum name/email length (default: 255)
    /// - `RBAC_PASSWORD_MIN_LEN`: Minimum password length (default: 8)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        let config = Self {
            page_size: parse_or(&lookup, "RBAC_PAGE_SIZE", default.page_size)?,
            name_max_len: parse_or(&lookup, "RBAC_NAME_MAX_LEN", default.name_max_len)?,
            password_min_len: parse_or(&lookup, "RBAC_PASSWORD_MIN_LEN", default.password_min_len)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject bounds that would make every listing or input unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(invalid("RBAC_PAGE_SIZE", "must be greater than zero"));
        }
        if self.name_max_len == 0 {
            return Err(invalid("RBAC_NAME_MAX_LEN", "must be greater than zero"));
        }
        Ok(())
    }

    /// Set the listing page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the minimum password length.
    pub fn with_password_min_len(mut self, len: usize) -> Self {
        self.password_min_len = len;
        self
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(key, &e.to_string())),
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
