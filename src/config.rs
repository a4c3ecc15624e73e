use serde::Deserialize;
use tracing::warn;

const DEFAULT_DATABASE_URL: &str = "sqlite://users.db";
const DEV_SECRET_KEY: &str = "dev-secret-key-change-in-production";
const DEFAULT_SESSION_TTL_MINUTES: i64 = 60 * 24 * 31;

/// Longest accepted session lifetime (one year).
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());

        let secret = match lookup("SECRET_KEY") {
            Some(s) if !s.is_empty() => s,
            _ => {
                warn!("SECRET_KEY is not set; sessions are signed with the development key");
                DEV_SECRET_KEY.into()
            }
        };

        let ttl_minutes = lookup("SESSION_TTL_MINUTES")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_SESSION_TTL_MINUTES);
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&ttl_minutes) {
            anyhow::bail!(
                "SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES}, got {ttl_minutes}"
            );
        }

        Ok(Self {
            database_url,
            session: SessionConfig {
                secret,
                ttl_minutes,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.session.secret, DEV_SECRET_KEY);
        assert_eq!(cfg.session.ttl_minutes, DEFAULT_SESSION_TTL_MINUTES);
    }

    #[test]
    fn empty_secret_falls_back_to_dev_key() {
        let cfg = load(&[("SECRET_KEY", "")]).unwrap();
        assert_eq!(cfg.session.secret, DEV_SECRET_KEY);
    }

    #[test]
    fn explicit_values_are_used() {
        let cfg = load(&[
            ("DATABASE_URL", "sqlite://other.db"),
            ("SECRET_KEY", "s3cret"),
            ("SESSION_TTL_MINUTES", "90"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url, "sqlite://other.db");
        assert_eq!(cfg.session.secret, "s3cret");
        assert_eq!(cfg.session.ttl_minutes, 90);
    }

    #[test]
    fn non_numeric_ttl_uses_default() {
        let cfg = load(&[("SESSION_TTL_MINUTES", "forever")]).unwrap();
        assert_eq!(cfg.session.ttl_minutes, DEFAULT_SESSION_TTL_MINUTES);
    }

    #[test]
    fn ttl_bounds_are_enforced() {
        let max = MAX_SESSION_TTL_MINUTES.to_string();
        assert_eq!(
            load(&[("SESSION_TTL_MINUTES", max.as_str())])
                .unwrap()
                .session
                .ttl_minutes,
            MAX_SESSION_TTL_MINUTES
        );

        let over = (MAX_SESSION_TTL_MINUTES + 1).to_string();
        for bad in ["0", "-5", "1000000000000", over.as_str()] {
            let err = load(&[("SESSION_TTL_MINUTES", bad)]).unwrap_err();
            assert!(err.to_string().contains("SESSION_TTL_MINUTES"));
        }
    }
}
