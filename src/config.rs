use std::{fmt::Display, ops::RangeInclusive, path::PathBuf, time::Duration};

use serde::Deserialize;
use thiserror::Error;

/// Every setting that failed validation, collected in one pass.
#[derive(Debug, Error)]
#[error("invalid environment variables:\n{}", .problems.join("\n"))]
pub struct ConfigError {
    pub problems: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub request_timeout_secs: u64,
    pub migrations_dir: PathBuf,
    pub run_migrations: bool,
}

/// Minimum secret length accepted for deriving the cookie signing key.
pub const MIN_SECRET_LEN: usize = 32;
/// Upper bound for `SESSION_TTL_HOURS`; expiries must fit a MySQL `TIMESTAMP`.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;
pub const MAX_DB_CONNECTIONS: u32 = 1000;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, reporting all problems at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = Reader {
            lookup: &lookup,
            problems: Vec::new(),
        };

        let host = env.optional("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = env.port("APP_PORT");
        let db_host = env.required("DB_MYSQL_HOST");
        let db_port = env.port("DB_MYSQL_PORT");
        let db_user = env.required("DB_MYSQL_USER");
        let db_password = env.required("DB_MYSQL_PASSWORD");
        let db_name = env.required("DB_MYSQL_DATABASE");
        let max_connections = env.bounded("DB_MAX_CONNECTIONS", 10u32, 1..=MAX_DB_CONNECTIONS);
        let secret = env.required("AUTH_SECRET");
        if let Some(secret) = &secret {
            if secret.len() < MIN_SECRET_LEN {
                env.problems.push(format!(
                    "AUTH_SECRET: must be at least {MIN_SECRET_LEN} bytes"
                ));
            }
        }
        let session_ttl_hours =
            env.bounded("SESSION_TTL_HOURS", 24 * 7i64, 1..=MAX_SESSION_TTL_HOURS);
        let cookie_secure = env.parsed("COOKIE_SECURE", false);
        let request_timeout_secs =
            env.bounded("REQUEST_TIMEOUT_SECS", 10u64, 1..=MAX_REQUEST_TIMEOUT_SECS);
        let migrations_dir = env
            .optional("MIGRATIONS_DIR")
            .unwrap_or_else(|| "better-auth_migrations".into());
        let run_migrations = env.parsed("RUN_MIGRATIONS", false);

        let problems = env.problems;
        match (port, db_host, db_port, db_user, db_password, db_name, secret) {
            (
                Some(port),
                Some(host_db),
                Some(port_db),
                Some(user),
                Some(password),
                Some(database),
                Some(secret),
            ) if problems.is_empty() => Ok(Self {
                host,
                port,
                database: DatabaseConfig {
                    host: host_db,
                    port: port_db,
                    user,
                    password,
                    database,
                    max_connections,
                },
                auth: AuthConfig {
                    secret,
                    session_ttl_hours,
                    cookie_secure,
                },
                request_timeout_secs,
                migrations_dir: PathBuf::from(migrations_dir),
                run_migrations,
            }),
            _ => Err(ConfigError { problems }),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_ttl(&self) -> time::Duration {
        time::Duration::hours(self.auth.session_ttl_hours)
    }
}

struct Reader<'a, F> {
    lookup: &'a F,
    problems: Vec<String>,
}

impl<F> Reader<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &str) -> Option<String> {
        let value = self.optional(key);
        if value.is_none() {
            self.problems.push(format!("{key}: is required"));
        }
        value
    }

    fn port(&mut self, key: &str) -> Option<u16> {
        let raw = self.required(key)?;
        match raw.parse::<u16>() {
            Ok(p) if p > 0 => Some(p),
            _ => {
                self.problems
                    .push(format!("{key}: must be a positive number"));
                None
            }
        }
    }

    fn parsed<T: std::str::FromStr>(&mut self, key: &str, default: T) -> T {
        match self.optional(key) {
            None => default,
            Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
                self.problems.push(format!("{key}: invalid value {raw:?}"));
                default
            }),
        }
    }

    fn bounded<T>(&mut self, key: &str, default: T, range: RangeInclusive<T>) -> T
    where
        T: std::str::FromStr + PartialOrd + Display + Copy,
    {
        let value = self.parsed(key, default);
        if !range.contains(&value) {
            self.problems.push(format!(
                "{key}: must be between {} and {}",
                range.start(),
                range.end()
            ));
        }
        value
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 3000,
        database: DatabaseConfig {
            host: "localhost".into(),
            port: 3306,
            user: "test".into(),
            password: "test".into(),
            database: "test".into(),
            max_connections: 1,
        },
        auth: AuthConfig {
            secret: "test-secret-test-secret-test-secret-0123".into(),
            session_ttl_hours: 1,
            cookie_secure: false,
        },
        request_timeout_secs: 5,
        migrations_dir: PathBuf::from("better-auth_migrations"),
        run_migrations: false,
    }
}
