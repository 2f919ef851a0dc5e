use std::time::Duration;

/// Build version reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Connection-pool and query bounds for Postgres.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Maximum pooled connections (default: `25`).
    pub max_connections: u32,
    /// Idle connections are closed after this long (default: 15 minutes).
    pub max_idle_time: Duration,
    /// Upper bound on any single storage call (default: 3 seconds).
    pub query_timeout: Duration,
}

/// Lifetimes of issued tokens and the expiry sweep cadence.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Authentication token lifetime (default: 24 hours).
    pub authentication_ttl: chrono::Duration,
    /// Activation token lifetime (default: 72 hours).
    pub activation_ttl: chrono::Duration,
    /// How often expired tokens are deleted (default: 1 hour).
    pub sweep_interval: Duration,
}

/// Server configuration loaded from environment variables.
///
/// Built once in `main` and shared read-only through [`crate::state::AppState`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `4000`).
    pub port: u16,
    /// Deployment environment label (default: `development`).
    pub environment: String,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub database: DatabaseConfig,
    pub tokens: TokenConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `4000`                  |
    /// | `APP_ENV`                    | `development`           |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `DB_MAX_CONNECTIONS`         | `25`                    |
    /// | `DB_MAX_IDLE_TIME_SECS`      | `900`                   |
    /// | `DB_QUERY_TIMEOUT_SECS`      | `3`                     |
    /// | `AUTH_TOKEN_TTL_HOURS`       | `24`                    |
    /// | `ACTIVATION_TOKEN_TTL_HOURS` | `72`                    |
    /// | `TOKEN_SWEEP_INTERVAL_SECS`  | `3600`                  |
    ///
    /// # Panics
    ///
    /// Panics if a variable is set but cannot be parsed. Misconfiguration
    /// should stop the process at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database = DatabaseConfig {
            max_connections: env_or("DB_MAX_CONNECTIONS", 25),
            max_idle_time: Duration::from_secs(env_or("DB_MAX_IDLE_TIME_SECS", 900)),
            query_timeout: Duration::from_secs(env_or("DB_QUERY_TIMEOUT_SECS", 3)),
        };

        let tokens = TokenConfig {
            authentication_ttl: chrono::Duration::hours(env_or("AUTH_TOKEN_TTL_HOURS", 24)),
            activation_ttl: chrono::Duration::hours(env_or("ACTIVATION_TOKEN_TTL_HOURS", 72)),
            sweep_interval: Duration::from_secs(env_or("TOKEN_SWEEP_INTERVAL_SECS", 3600)),
        };

        Self {
            host,
            port: env_or("PORT", 4000),
            environment,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            database,
            tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_when_unset() {
        assert_eq!(env_or("MARQUEE_TEST_UNSET_VAR", 42u32), 42);
    }

    #[test]
    fn version_is_crate_version() {
        assert!(!VERSION.is_empty());
    }
}
