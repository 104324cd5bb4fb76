use std::path::PathBuf;
use std::time::Duration;

use super::ConfigError;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_URL: &str = "sqlite://filehost.db";
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;
const DEFAULT_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Process-level settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub storage_path: Option<PathBuf>,
    pub cleanup_interval: Duration,
    pub token_ttl: Duration,
    pub secret_key: Option<String>,
    pub admin_usernames: Vec<String>,
    pub file_policy_path: Option<PathBuf>,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let cleanup_interval_secs = parse_or(
            "CLEANUP_INTERVAL_SECS",
            lookup("CLEANUP_INTERVAL_SECS"),
            DEFAULT_CLEANUP_INTERVAL_SECS,
        )?;
        if cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "CLEANUP_INTERVAL_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }
        let token_ttl_secs = parse_or(
            "TOKEN_TTL_SECS",
            lookup("TOKEN_TTL_SECS"),
            DEFAULT_TOKEN_TTL_SECS,
        )?;
        if i64::try_from(token_ttl_secs).is_err() {
            return Err(ConfigError::Invalid {
                name: "TOKEN_TTL_SECS",
                reason: format!("must not exceed {}", i64::MAX),
            });
        }

        Ok(Self {
            port,
            database_url: lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            storage_path: lookup("STORAGE_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            cleanup_interval: Duration::from_secs(cleanup_interval_secs),
            token_ttl: Duration::from_secs(token_ttl_secs),
            secret_key: lookup("SECRET_KEY"),
            admin_usernames: lookup("ADMIN_USERNAMES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            file_policy_path: lookup("FILE_POLICY_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS").map(|v| split_list(&v)),
        })
    }
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.database_url, "sqlite://filehost.db");
        assert_eq!(cfg.cleanup_interval, Duration::from_secs(300));
        assert!(cfg.storage_path.is_none());
        assert!(cfg.cors_allowed_origins.is_none());
    }

    #[test]
    fn cleanup_interval_is_configurable() {
        let cfg = config(&[("CLEANUP_INTERVAL_SECS", "10")]).unwrap();
        assert_eq!(cfg.cleanup_interval, Duration::from_secs(10));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = config(&[("CLEANUP_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "CLEANUP_INTERVAL_SECS",
                ..
            }
        ));
    }

    #[test]
    fn token_ttl_past_i64_is_rejected() {
        let err = config(&[("TOKEN_TTL_SECS", "9223372036854775808")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "TOKEN_TTL_SECS",
                ..
            }
        ));
        let cfg = config(&[("TOKEN_TTL_SECS", "120")]).unwrap();
        assert_eq!(cfg.token_ttl, Duration::from_secs(120));
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(config(&[("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn admin_list_is_split_and_trimmed() {
        let cfg = config(&[("ADMIN_USERNAMES", "alice, bob,,")]).unwrap();
        assert_eq!(cfg.admin_usernames, vec!["alice", "bob"]);
    }
}
