/*
 * Responsibility
 * - Read environment variables once at startup (DATABASE_URL, JWT secret, credential sources ...)
 * - Validate required values (missing => refuse to start)
 * - The resulting Config is injected; nothing below app.rs reads the environment
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TOKEN_HEADER: &str = "X-Auth-Token";
pub const DEFAULT_TOKEN_COOKIE: &str = "auth_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for the verify boundary.
///
/// Kept separate from [`Config`] so the auth services can be built without a
/// database URL (tests, alternative directories).
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,

    pub token_header: String,
    pub token_cookie: String,

    pub verify_timeout: Duration,
    pub capability_queries: bool,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the shared secret
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_seconds", &self.leeway_seconds)
            .field("token_header", &self.token_header)
            .field("token_cookie", &self.token_cookie)
            .field("verify_timeout", &self.verify_timeout)
            .field("capability_queries", &self.capability_queries)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: None,
            audience: None,
            leeway_seconds: 0,
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            token_cookie: DEFAULT_TOKEN_COOKIE.to_string(),
            verify_timeout: Duration::from_millis(5000),
            capability_queries: true,
        }
    }
}

/// Transport-level limits applied to every route.
#[derive(Debug, Clone, Copy)]
pub struct HttpConfig {
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,

    pub app_env: AppEnv,

    pub http: HttpConfig,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(5);

        let app_env = AppEnv::from_env();

        let mut http = HttpConfig::default();
        if let Some(secs) = non_empty_var("HTTP_REQUEST_TIMEOUT_SECONDS") {
            let secs = secs
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("HTTP_REQUEST_TIMEOUT_SECONDS"))?;
            http.request_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = non_empty_var("HTTP_BODY_LIMIT_BYTES") {
            http.body_limit_bytes = bytes
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid("HTTP_BODY_LIMIT_BYTES"))?;
        }

        let jwt_secret =
            std::env::var("AUTH_JWT_SECRET").map_err(|_| ConfigError::Missing("AUTH_JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("AUTH_JWT_SECRET"));
        }

        let mut auth = AuthConfig::new(jwt_secret);

        auth.issuer = non_empty_var("AUTH_ISSUER");
        auth.audience = non_empty_var("AUTH_AUDIENCE");

        auth.leeway_seconds = std::env::var("ACCESS_TOKEN_LEEWAY_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);

        if let Some(header) = non_empty_var("AUTH_TOKEN_HEADER") {
            auth.token_header = header;
        }
        if let Some(cookie) = non_empty_var("AUTH_TOKEN_COOKIE") {
            auth.token_cookie = cookie;
        }

        if let Some(ms) = non_empty_var("AUTH_VERIFY_TIMEOUT_MS") {
            let ms = ms
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("AUTH_VERIFY_TIMEOUT_MS"))?;
            auth.verify_timeout = Duration::from_millis(ms);
        }

        auth.capability_queries = match non_empty_var("AUTH_CAPABILITY_QUERIES") {
            None => true,
            Some(v) => parse_flag(&v).ok_or(ConfigError::Invalid("AUTH_CAPABILITY_QUERIES"))?,
        };

        validate_timeouts(&http, &auth)?;

        Ok(Self {
            addr,
            database_url,
            database_max_connections,
            app_env,
            http,
            auth,
        })
    }
}

/// The verify guard must fire before the global request timeout, otherwise a
/// slow directory surfaces as 408 instead of the 401 envelope.
fn validate_timeouts(http: &HttpConfig, auth: &AuthConfig) -> Result<(), ConfigError> {
    if auth.verify_timeout.is_zero() || auth.verify_timeout >= http.request_timeout {
        return Err(ConfigError::Invalid("AUTH_VERIFY_TIMEOUT_MS"));
    }
    Ok(())
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
