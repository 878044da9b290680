use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_port: u16,
    pub database_url: String,
    pub settings_cache_ttl: Duration,
    pub catalog_cache_ttl: Duration,
    pub session_ttl: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            listen_port: env_or("LISTEN_PORT", 8080)?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            settings_cache_ttl: Duration::from_secs(env_or("SETTINGS_CACHE_TTL_SECS", 60u64)?),
            catalog_cache_ttl: Duration::from_secs(env_or("CATALOG_CACHE_TTL_SECS", 60u64)?),
            session_ttl: Duration::from_secs(env_or("SESSION_TTL_MINS", 720u64)? * 60),
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {key} value '{raw}': {e}")),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_to_default() {
        let port: u16 = env_or("ATELIER_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn env_or_rejects_garbage() {
        // SAFETY: key is unique to this test and never read concurrently.
        unsafe { env::set_var("ATELIER_TEST_BAD_PORT", "not-a-port") };
        let result: Result<u16> = env_or("ATELIER_TEST_BAD_PORT", 8080);
        assert!(result.is_err());
        unsafe { env::remove_var("ATELIER_TEST_BAD_PORT") };
    }
}
