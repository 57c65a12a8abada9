//! Process configuration from `BOXOFFICE_*` environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

const DEV_JWT_SECRET: &str = "dev-secret";
/// One year.
const MAX_EVENT_CACHE_TTL_SECS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub event_cache_ttl: Duration,
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub lock_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            event_cache_ttl: Duration::from_secs(600),
            default_page_size: 15,
            max_page_size: 100,
            lock_timeout: Duration::from_millis(2000),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Unset variables take their
    /// defaults; malformed ones are errors naming the variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_addr = parse_or("BOXOFFICE_BIND_ADDR", &lookup, defaults.bind_addr)?;

        let jwt_secret = match lookup("BOXOFFICE_JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("BOXOFFICE_JWT_SECRET not set; using insecure dev default");
                defaults.jwt_secret
            }
        };

        let ttl_secs: u64 = parse_or(
            "BOXOFFICE_EVENT_CACHE_TTL_SECS",
            &lookup,
            defaults.event_cache_ttl.as_secs(),
        )?;
        let default_page_size: u32 = parse_or("BOXOFFICE_DEFAULT_PAGE_SIZE", &lookup, defaults.default_page_size)?;
        let max_page_size: u32 = parse_or("BOXOFFICE_MAX_PAGE_SIZE", &lookup, defaults.max_page_size)?;
        let lock_timeout_ms: u64 = parse_or(
            "BOXOFFICE_LOCK_TIMEOUT_MS",
            &lookup,
            defaults.lock_timeout.as_millis() as u64,
        )?;

        if default_page_size == 0 || max_page_size == 0 {
            bail!("BOXOFFICE_DEFAULT_PAGE_SIZE and BOXOFFICE_MAX_PAGE_SIZE must be at least 1");
        }
        if default_page_size > max_page_size {
            bail!("BOXOFFICE_DEFAULT_PAGE_SIZE ({default_page_size}) exceeds BOXOFFICE_MAX_PAGE_SIZE ({max_page_size})");
        }
        if ttl_secs > MAX_EVENT_CACHE_TTL_SECS {
            bail!("BOXOFFICE_EVENT_CACHE_TTL_SECS ({ttl_secs}) exceeds the maximum of {MAX_EVENT_CACHE_TTL_SECS}");
        }
        if lock_timeout_ms == 0 {
            bail!("BOXOFFICE_LOCK_TIMEOUT_MS must be at least 1");
        }

        Ok(Self {
            bind_addr,
            jwt_secret,
            event_cache_ttl: Duration::from_secs(ttl_secs),
            default_page_size,
            max_page_size,
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        })
    }

    /// Cache TTL as a chrono duration for clock arithmetic.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.event_cache_ttl).unwrap_or(chrono::Duration::minutes(10))
    }
}

fn parse_or<T>(name: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {name}: {raw:?}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.cache_ttl(), chrono::Duration::minutes(10));
    }

    #[test]
    fn values_are_read_from_the_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BOXOFFICE_BIND_ADDR", "127.0.0.1:9000"),
            ("BOXOFFICE_JWT_SECRET", "s3cret"),
            ("BOXOFFICE_EVENT_CACHE_TTL_SECS", "30"),
            ("BOXOFFICE_DEFAULT_PAGE_SIZE", "20"),
            ("BOXOFFICE_MAX_PAGE_SIZE", "50"),
            ("BOXOFFICE_LOCK_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.event_cache_ttl, Duration::from_secs(30));
        assert_eq!((config.default_page_size, config.max_page_size), (20, 50));
        assert_eq!(config.lock_timeout, Duration::from_millis(250));
    }

    #[test]
    fn malformed_value_names_the_variable() {
        let err = AppConfig::from_lookup(lookup(&[("BOXOFFICE_MAX_PAGE_SIZE", "lots")])).unwrap_err();
        assert!(err.to_string().contains("BOXOFFICE_MAX_PAGE_SIZE"));
    }

    #[test]
    fn default_page_size_cannot_exceed_max() {
        let err = AppConfig::from_lookup(lookup(&[
            ("BOXOFFICE_DEFAULT_PAGE_SIZE", "200"),
            ("BOXOFFICE_MAX_PAGE_SIZE", "100"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn oversized_cache_ttl_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("BOXOFFICE_EVENT_CACHE_TTL_SECS", "1000000000000000")])).unwrap_err();
        assert!(err.to_string().contains("BOXOFFICE_EVENT_CACHE_TTL_SECS"));

        let year = AppConfig::from_lookup(lookup(&[("BOXOFFICE_EVENT_CACHE_TTL_SECS", "31536000")])).unwrap();
        assert_eq!(year.cache_ttl(), chrono::Duration::days(365));
    }
}
