use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use permbit_application::DEFAULT_PERMISSION_CACHE_TTL_SECONDS;
use permbit_core::AppError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCacheBackend {
    InMemory,
    Redis,
}

impl FromStr for PermissionCacheBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "in_memory" | "memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            other => Err(AppError::Validation(format!(
                "PERMISSION_CACHE_BACKEND must be either 'in_memory' or 'redis', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub permission_cache_backend: PermissionCacheBackend,
    pub permission_cache_ttl_seconds: u32,
    pub permission_guard_debug: bool,
    pub permission_sync_on_startup: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(|name| env::var(name).ok(), migrate_only)
    }

    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        migrate_only: bool,
    ) -> Result<Self, AppError> {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::Validation(format!("{name} is required")))
        };

        let database_url = required("DATABASE_URL")?;
        let bootstrap_token = required("AUTH_BOOTSTRAP_TOKEN")?;
        let redis_url = lookup("REDIS_URL").filter(|value| !value.trim().is_empty());
        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = match lookup("API_PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))?,
            None => 3001,
        };

        let permission_cache_backend = lookup("PERMISSION_CACHE_BACKEND")
            .map(|value| PermissionCacheBackend::from_str(value.as_str()))
            .transpose()?
            .unwrap_or(PermissionCacheBackend::InMemory);
        if permission_cache_backend == PermissionCacheBackend::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when PERMISSION_CACHE_BACKEND=redis".to_owned(),
            ));
        }

        let permission_cache_ttl_seconds = match lookup("PERMISSION_CACHE_TTL_SECONDS") {
            Some(value) => parse_ttl_seconds(value.as_str())?,
            None => DEFAULT_PERMISSION_CACHE_TTL_SECONDS,
        };

        let flag = |name: &str, default: bool| parse_flag(name, lookup(name), default);
        let cookie_secure = flag("SESSION_COOKIE_SECURE", false)?;
        let permission_guard_debug = flag("PERMISSION_GUARD_DEBUG", false)?;
        let permission_sync_on_startup = flag("PERMISSION_SYNC_ON_STARTUP", true)?;

        Ok(Self {
            migrate_only,
            database_url,
            redis_url,
            frontend_url,
            bootstrap_token,
            api_host,
            api_port,
            cookie_secure,
            permission_cache_backend,
            permission_cache_ttl_seconds,
            permission_guard_debug,
            permission_sync_on_startup,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_flag(name: &str, value: Option<String>, default: bool) -> Result<bool, AppError> {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "invalid {name} '{value}', expected true or false"
        ))),
    }
}

fn parse_ttl_seconds(value: &str) -> Result<u32, AppError> {
    let ttl_seconds = value.trim().parse::<u32>().map_err(|error| {
        AppError::Validation(format!("invalid PERMISSION_CACHE_TTL_SECONDS: {error}"))
    })?;

    if ttl_seconds == 0 {
        return Err(AppError::Validation(
            "PERMISSION_CACHE_TTL_SECONDS must be greater than zero".to_owned(),
        ));
    }

    Ok(ttl_seconds)
}
