use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Remote REST API settings shared by the OpenSanctions and Sanctions.io clients
#[derive(Clone, Debug)]
pub struct RemoteApiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Retry policy for transient network failures
#[derive(Clone, Debug)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

#[derive(Clone, Debug)]
pub struct CircuitSettings {
    pub fail_max: u32,
    pub reset_timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: usize,
}

#[derive(Clone, Debug)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl: Duration,
}

#[derive(Clone, Debug)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub max_requests: usize,
    pub window: Duration,
}

/// Process-wide settings, read once at startup
#[derive(Clone, Debug)]
pub struct Settings {
    pub environment: String,
    pub host: String,
    pub port: u16,
    pub opensanctions: RemoteApiSettings,
    pub sanctions_io: RemoteApiSettings,
    pub retry: RetrySettings,
    pub circuit: CircuitSettings,
    pub source_timeout: Duration,
    /// None when NEO4J_URI or NEO4J_PASSWORD is unset; the offshore source is then unavailable
    pub neo4j: Option<Neo4jSettings>,
    pub database_url: Option<String>,
    pub local_fuzzy_threshold: u8,
    pub cache: CacheSettings,
    pub rate_limit: RateLimitSettings,
}

impl Settings {
    /// Load `.env` (if present) and read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if dotenv::dotenv().is_err() {
            tracing::debug!("No .env file found, using process environment");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup: &lookup };

        let neo4j = match (env.optional("NEO4J_URI"), env.optional("NEO4J_PASSWORD")) {
            (Some(uri), Some(password)) => Some(Neo4jSettings {
                uri,
                user: env.string_or("NEO4J_USER", "neo4j"),
                password,
                max_connections: env.parse_or("NEO4J_MAX_CONNECTION_POOL_SIZE", 50)?,
            }),
            _ => None,
        };

        Ok(Self {
            environment: env.string_or("ENVIRONMENT", "development"),
            host: env.string_or("HOST", "0.0.0.0"),
            port: env.parse_or("PORT", 8080)?,
            opensanctions: RemoteApiSettings {
                base_url: env.string_or("OPENSANCTIONS_BASE_URL", "https://api.opensanctions.org"),
                api_key: env.optional("OPENSANCTIONS_API_KEY"),
                timeout: env.secs_or("OPENSANCTIONS_TIMEOUT", 5.0)?,
            },
            sanctions_io: RemoteApiSettings {
                base_url: env.string_or("SANCTIONS_IO_BASE_URL", "https://api.sanctions.io"),
                api_key: env.optional("SANCTIONS_IO_API_KEY"),
                timeout: env.secs_or("SANCTIONS_IO_TIMEOUT", 5.0)?,
            },
            retry: RetrySettings {
                max_attempts: env.parse_or("API_MAX_RETRIES", 3)?,
                min_wait: env.secs_or("API_RETRY_MIN_WAIT", 1.0)?,
                max_wait: env.secs_or("API_RETRY_MAX_WAIT", 10.0)?,
            },
            circuit: CircuitSettings {
                fail_max: env.parse_or("CIRCUIT_FAIL_MAX", 5)?,
                reset_timeout: env.secs_or("CIRCUIT_RESET_TIMEOUT", 30.0)?,
            },
            source_timeout: env.secs_or("SEARCH_SOURCE_TIMEOUT_SECS", 15.0)?,
            neo4j,
            database_url: env.optional("DATABASE_URL"),
            local_fuzzy_threshold: env.parse_or("LOCAL_FUZZY_THRESHOLD", 70)?,
            cache: CacheSettings {
                enabled: env.flag_or("ENABLE_CACHE", true),
                ttl: env.secs_or("CACHE_TTL_SECONDS", 300.0)?,
            },
            rate_limit: RateLimitSettings {
                enabled: env.flag_or("ENABLE_RATE_LIMITING", true),
                max_requests: env.parse_or("RATE_LIMIT_MAX_REQUESTS", 100)?,
                window: env.secs_or("RATE_LIMIT_WINDOW_SECONDS", 60.0)?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

struct Env<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
            None => Ok(default),
        }
    }

    fn secs_or(&self, key: &str, default: f64) -> Result<Duration, ConfigError> {
        let secs: f64 = self.parse_or(key, default)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value: secs.to_string(),
            });
        }
        Ok(Duration::from_secs_f64(secs))
    }

    fn flag_or(&self, key: &str, default: bool) -> bool {
        match self.optional(key).map(|v| v.to_ascii_lowercase()) {
            Some(v) => matches!(v.as_str(), "1" | "true" | "yes" | "on"),
            None => default,
        }
    }
}
