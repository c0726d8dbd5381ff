//! Configuration loading from the process environment.

use std::net::SocketAddr;
use std::str::FromStr;

use tracing::warn;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEV_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3_600;
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 604_800;
/// One year; longer lifetimes are clamped.
pub const MAX_TOKEN_TTL_SECS: i64 = 31_536_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub seed_sample_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            use_persistent_stores: false,
            database_url: None,
            seed_sample_data: false,
        }
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "unparseable value; using default");
            default
        }),
    }
}

fn parse_ttl(name: &str, raw: Option<String>, default: i64) -> i64 {
    let secs = parse_or(name, raw, default);
    let clamped = secs.clamp(1, MAX_TOKEN_TTL_SECS);
    if clamped != secs {
        warn!(variable = name, value = secs, clamped, "token lifetime out of range");
    }
    clamped
}

fn parse_flag(name: &str, raw: Option<String>) -> bool {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => false,
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off" | "") => false,
        Some(v) => {
            warn!(variable = name, value = %v, "unrecognized boolean; using false");
            false
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set; using insecure dev default");
                defaults.jwt_secret
            }
        };

        let use_persistent_stores = parse_flag(
            "USE_PERSISTENT_STORES",
            lookup("USE_PERSISTENT_STORES"),
        );
        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());

        Self {
            bind_addr: parse_or("BIND_ADDR", lookup("BIND_ADDR"), defaults.bind_addr),
            jwt_secret,
            access_token_ttl_secs: parse_ttl(
                "ACCESS_TOKEN_TTL_SECS",
                lookup("ACCESS_TOKEN_TTL_SECS"),
                defaults.access_token_ttl_secs,
            ),
            refresh_token_ttl_secs: parse_ttl(
                "REFRESH_TOKEN_TTL_SECS",
                lookup("REFRESH_TOKEN_TTL_SECS"),
                defaults.refresh_token_ttl_secs,
            ),
            use_persistent_stores,
            database_url,
            seed_sample_data: parse_flag("SEED_SAMPLE_DATA", lookup("SEED_SAMPLE_DATA")),
        }
    }

    /// The database URL, required when persistent stores are enabled.
    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set when USE_PERSISTENT_STORES=true"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
    }

    #[test]
    fn values_are_parsed() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("ACCESS_TOKEN_TTL_SECS", "60"),
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/dreambook"),
            ("SEED_SAMPLE_DATA", "1"),
        ]));
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.access_token_ttl_secs, 60);
        assert_eq!(config.refresh_token_ttl_secs, DEFAULT_REFRESH_TOKEN_TTL_SECS);
        assert!(config.use_persistent_stores);
        assert!(config.seed_sample_data);
        assert_eq!(config.require_database_url().unwrap(), "postgres://localhost/dreambook");
    }

    #[test]
    fn garbage_falls_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "not an address"),
            ("ACCESS_TOKEN_TTL_SECS", "soon"),
            ("SEED_SAMPLE_DATA", "maybe"),
        ]));
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.access_token_ttl_secs, DEFAULT_ACCESS_TOKEN_TTL_SECS);
        assert!(!config.seed_sample_data);
    }

    #[test]
    fn token_lifetimes_are_clamped() {
        let config = AppConfig::from_lookup(lookup(&[
            ("ACCESS_TOKEN_TTL_SECS", "9223372036854775807"),
            ("REFRESH_TOKEN_TTL_SECS", "-5"),
        ]));
        assert_eq!(config.access_token_ttl_secs, MAX_TOKEN_TTL_SECS);
        assert_eq!(config.refresh_token_ttl_secs, 1);

        let _ = chrono::Duration::seconds(config.access_token_ttl_secs);
    }

    #[test]
    fn persistent_stores_need_a_url() {
        let config = AppConfig::from_lookup(lookup(&[("USE_PERSISTENT_STORES", "true")]));
        assert!(config.require_database_url().is_err());
    }
}
