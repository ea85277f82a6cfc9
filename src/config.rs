use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Which repository implementation backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryKind {
    Postgres,
    Memory,
}

impl std::str::FromStr for RepositoryKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown repository kind: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsConfig {
    pub low_stock_threshold: i32,
    pub expiry_warning_days: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10,
            expiry_warning_days: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub repository: RepositoryKind,
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let repository = std::env::var("REPOSITORY")
            .ok()
            .map(|v| v.parse::<RepositoryKind>())
            .transpose()?
            .unwrap_or(RepositoryKind::Postgres);
        let database_url = std::env::var("DATABASE_URL").ok();
        if repository == RepositoryKind::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when REPOSITORY=postgres");
        }

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "pharmacy-inventory".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "pharmacy-staff".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES").unwrap_or(60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES").unwrap_or(60 * 24 * 14),
        };

        let defaults = AnalyticsConfig::default();
        let analytics = AnalyticsConfig {
            low_stock_threshold: env_parse("LOW_STOCK_THRESHOLD")
                .unwrap_or(defaults.low_stock_threshold),
            expiry_warning_days: env_parse("EXPIRY_WARNING_DAYS")
                .unwrap_or(defaults.expiry_warning_days),
        };

        Ok(Self {
            repository,
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parse("APP_PORT").unwrap_or(8080),
            jwt,
            analytics,
        })
    }

    /// Configuration used by unit tests: memory repository, short-lived tokens.
    pub fn for_tests() -> Self {
        Self {
            repository: RepositoryKind::Memory,
            database_url: None,
            host: "127.0.0.1".into(),
            port: 0,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            analytics: AnalyticsConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repository_kind() {
        assert_eq!("postgres".parse::<RepositoryKind>().unwrap(), RepositoryKind::Postgres);
        assert_eq!(" Memory ".parse::<RepositoryKind>().unwrap(), RepositoryKind::Memory);
        assert!("sqlite".parse::<RepositoryKind>().is_err());
    }
}
