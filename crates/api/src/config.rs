use std::str::FromStr;
use std::time::Duration;

use movies_core::pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use movies_db::PoolSettings;

use crate::auth::AuthConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except `DATABASE_URL` have defaults suitable for local
/// development. Read once at process start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins. A single `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub auth: AuthConfig,
}

/// Store connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool: PoolSettings,
    /// Deadline for all store calls made on behalf of one request.
    pub query_timeout: Duration,
}

/// Page size bounds for list endpoints.
#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Output format of the `fmt` tracing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` (`pretty` or `json`, default `pretty`).
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Pretty,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default   |
    /// |---------------------------|-----------|
    /// | `HOST`                    | `0.0.0.0` |
    /// | `PORT`                    | `8000`    |
    /// | `CORS_ORIGINS`            | `*`       |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`      |
    /// | `DATABASE_URL`            | required  |
    /// | `DB_MAX_CONNECTIONS`      | `10`      |
    /// | `DB_MIN_CONNECTIONS`      | `2`       |
    /// | `DB_ACQUIRE_TIMEOUT_SECS` | `5`       |
    /// | `DB_QUERY_TIMEOUT_MS`     | `5000`    |
    /// | `DEFAULT_PAGE_SIZE`       | `20`      |
    /// | `MAX_PAGE_SIZE`           | `100`     |
    ///
    /// Authentication variables are documented on [`AuthConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics if `DATABASE_URL` is missing or any value fails to parse, so
    /// misconfiguration stops the process before it binds a port.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 8000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let query_timeout = Duration::from_millis(env_or("DB_QUERY_TIMEOUT_MS", 5000));
        let database = DatabaseConfig {
            url: database_url,
            pool: PoolSettings {
                max_connections: env_or("DB_MAX_CONNECTIONS", 10),
                min_connections: env_or("DB_MIN_CONNECTIONS", 2),
                acquire_timeout: Duration::from_secs(env_or("DB_ACQUIRE_TIMEOUT_SECS", 5)),
                statement_timeout: query_timeout,
            },
            query_timeout,
        };

        let pagination = PaginationConfig::new(
            env_or("DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            env_or("MAX_PAGE_SIZE", MAX_PAGE_SIZE),
        );

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database,
            pagination,
            auth: AuthConfig::from_env(),
        }
    }
}

impl PaginationConfig {
    /// Build page size bounds, keeping them inside `1..=MAX_PAGE_SIZE` and
    /// the default inside `1..=max`.
    pub fn new(default_page_size: u32, max_page_size: u32) -> Self {
        let max_page_size = max_page_size.clamp(1, MAX_PAGE_SIZE);
        let default_page_size = default_page_size.clamp(1, max_page_size);
        Self {
            default_page_size,
            max_page_size,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse as `T`.
pub(crate) fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
