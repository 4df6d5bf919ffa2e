/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, CORS 許可、JWT、Gateway 信頼境界など)
 * - 設定値のバリデーション (不足・危険な値なら起動失敗)
 *
 * Notes
 * - from_lookup() はテスト用に env を差し替えられる入口 (process env を汚さない)
 */
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Well-known development secret. Never acceptable in production.
pub const DEV_JWT_SECRET: &str = "default-secret-change-in-production";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    /// Unset means development. Unknown names (staging, typos) are rejected
    /// so they never pick up the development JWT secret.
    fn parse(raw: Option<String>) -> Result<Self, ConfigError> {
        let Some(raw) = raw else {
            return Ok(Self::Development);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::Invalid("APP_ENV")),
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
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

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_ttl_seconds", &self.access_token_ttl_seconds)
            .field("refresh_token_ttl_seconds", &self.refresh_token_ttl_seconds)
            .finish()
    }
}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,

    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub jwt: JwtConfig,

    pub redis_url: Option<String>,
    pub role_cache_ttl: Duration,

    pub request_timeout: Duration,
    pub request_body_limit_bytes: usize,

    pub trusted_proxies: Vec<IpAddr>,
    pub gateway_require_role: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // database_url / redis_url may carry credentials
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt", &self.jwt)
            .field("redis", &self.redis_url.is_some())
            .field("role_cache_ttl", &self.role_cache_ttl)
            .field("request_timeout", &self.request_timeout)
            .field("request_body_limit_bytes", &self.request_body_limit_bytes)
            .field("trusted_proxies", &self.trusted_proxies)
            .field("gateway_require_role", &self.gateway_require_role)
            .finish()
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_bool(raw: Option<String>) -> bool {
    matches!(
        raw.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(get("PORT"), 3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let app_env = AppEnv::parse(get("APP_ENV"))?;

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let secret = resolve_jwt_secret(app_env, get("JWT_SECRET"))?;

        let jwt = JwtConfig {
            secret,
            access_token_ttl_seconds: parse_or(get("JWT_ACCESS_TOKEN_TTL_SECONDS"), 900), // 15 min
            refresh_token_ttl_seconds: parse_or(get("JWT_REFRESH_TOKEN_TTL_SECONDS"), 604_800), // 168 h
        };
        if jwt.access_token_ttl_seconds == 0 {
            return Err(ConfigError::Invalid("JWT_ACCESS_TOKEN_TTL_SECONDS"));
        }
        if jwt.refresh_token_ttl_seconds == 0 {
            return Err(ConfigError::Invalid("JWT_REFRESH_TOKEN_TTL_SECONDS"));
        }

        let redis_url = get("REDIS_URL").filter(|s| !s.trim().is_empty());
        let role_cache_ttl = Duration::from_secs(parse_or(get("ROLE_CACHE_TTL_SECONDS"), 300));

        let request_timeout = Duration::from_secs(parse_or(get("REQUEST_TIMEOUT_SECONDS"), 30));
        let request_body_limit_bytes = parse_or(get("REQUEST_BODY_LIMIT_BYTES"), 1024 * 1024);

        let trusted_proxies = get("TRUSTED_PROXIES")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<IpAddr>()
                    .map_err(|_| ConfigError::Invalid("TRUSTED_PROXIES"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let gateway_require_role = parse_bool(get("GATEWAY_REQUIRE_ROLE"));

        Ok(Self {
            addr,
            database_url,
            app_env,
            cors_allowed_origins,
            jwt,
            redis_url,
            role_cache_ttl,
            request_timeout,
            request_body_limit_bytes,
            trusted_proxies,
            gateway_require_role,
        })
    }
}

// Production must carry its own secret. Development falls back to the
// well-known default, loudly.
fn resolve_jwt_secret(app_env: AppEnv, raw: Option<String>) -> Result<String, ConfigError> {
    let secret = raw.filter(|s| !s.is_empty());

    match (app_env, secret) {
        (AppEnv::Production, None) => Err(ConfigError::Missing("JWT_SECRET")),
        (AppEnv::Production, Some(s)) if s == DEV_JWT_SECRET => {
            Err(ConfigError::Invalid("JWT_SECRET"))
        }
        (AppEnv::Production, Some(s)) => Ok(s),
        (AppEnv::Development, Some(s)) => {
            if s == DEV_JWT_SECRET {
                tracing::warn!("JWT_SECRET is the development default; never deploy this");
            }
            Ok(s)
        }
        (AppEnv::Development, None) => {
            tracing::warn!("JWT_SECRET not set; using the insecure development default");
            Ok(DEV_JWT_SECRET.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/app")]).unwrap();

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.jwt.secret, DEV_JWT_SECRET);
        assert_eq!(config.jwt.access_token_ttl_seconds, 900);
        assert_eq!(config.jwt.refresh_token_ttl_seconds, 604_800);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.redis_url.is_none());
        assert!(config.trusted_proxies.is_empty());
        assert!(!config.gateway_require_role);
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
    }

    #[test]
    fn production_rejects_dev_secret() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db/app"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", DEV_JWT_SECRET),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("JWT_SECRET"));
    }

    #[test]
    fn production_requires_secret() {
        let err = load(&[("DATABASE_URL", "postgres://db/app"), ("APP_ENV", "prod")]).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));
    }

    #[test]
    fn production_with_real_secret() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/app"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cr3t-from-vault"),
            ("TRUSTED_PROXIES", "10.0.0.1, 10.0.0.2"),
            ("GATEWAY_REQUIRE_ROLE", "true"),
        ])
        .unwrap();

        assert!(config.app_env.is_production());
        assert_eq!(config.trusted_proxies.len(), 2);
        assert!(config.gateway_require_role);
    }

    #[test]
    fn unknown_app_env_is_invalid() {
        for env in ["staging", "qa", "prodution"] {
            let err = load(&[("DATABASE_URL", "postgres://db/app"), ("APP_ENV", env)]).unwrap_err();
            assert_eq!(err, ConfigError::Invalid("APP_ENV"), "APP_ENV={env}");
        }
    }

    #[test]
    fn development_aliases_are_accepted() {
        for env in ["development", "dev", "local", " Dev "] {
            let config = load(&[("DATABASE_URL", "postgres://db/app"), ("APP_ENV", env)]).unwrap();
            assert_eq!(config.app_env, AppEnv::Development);
            assert_eq!(config.jwt.secret, DEV_JWT_SECRET);
        }
    }

    #[test]
    fn bad_proxy_address_is_invalid() {
        let err = load(&[
            ("DATABASE_URL", "postgres://db/app"),
            ("TRUSTED_PROXIES", "gateway.internal"),
        ])
        .unwrap_err();
        assert_eq!(err, ConfigError::Invalid("TRUSTED_PROXIES"));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = load(&[
            ("DATABASE_URL", "postgres://user:pw@db/app"),
            ("JWT_SECRET", "top-secret"),
        ])
        .unwrap();
        let printed = format!("{config:?}");

        assert!(!printed.contains("top-secret"));
        assert!(!printed.contains("pw@db"));
    }
}
