// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf};

use thiserror::Error;

/// Default token lifetime: one day.
const DEFAULT_JWT_EXPIRATION: u64 = 86_400;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub app_addr: SocketAddr,
    /// Root directory for user uploads, served under `/uploads`.
    pub upload_dir: PathBuf,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration = match lookup("JWT_EXPIRATION") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "JWT_EXPIRATION",
                value,
            })?,
            None => DEFAULT_JWT_EXPIRATION,
        };

        let rust_log = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let app_addr = match lookup("APP_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "APP_ADDR",
                value,
            })?,
            None => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        let upload_dir = lookup("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("uploads"));

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            app_addr,
            upload_dir,
            admin_email: lookup("ADMIN_EMAIL"),
            admin_password: lookup("ADMIN_PASSWORD"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/quiz"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.jwt_expiration, DEFAULT_JWT_EXPIRATION);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.app_addr.port(), 3000);
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert!(config.admin_email.is_none());
    }

    #[test]
    fn test_missing_secret() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_invalid_expiration() {
        let err = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("JWT_EXPIRATION", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JWT_EXPIRATION", .. }));
    }
}
