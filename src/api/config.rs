//! Process configuration read from environment variables.

use crate::services::orcid_service::DEFAULT_ORCID_API_URL;
use anyhow::{Context, Result, anyhow, bail};
use std::env;
use std::path::PathBuf;
use tracing::warn;
use url::Url;

pub const DEFAULT_PORT: u16 = 8081;
pub const DEFAULT_ACTIVITY_LOG_PATH: &str = "logs/activity.jsonl";
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 600;
const DEV_JWT_SECRET: &str = "dev-secret-do-not-use-in-production-change-me-now";
const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub is_development: bool,
    pub jwt_secret: String,
    pub orcid_api_url: Url,
    /// `None` disables the activity log
    pub activity_log_path: Option<PathBuf>,
    pub rate_limit_per_minute: u32,
    /// Empty means permissive CORS
    pub cors_allowed_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string());

        let app_env = get("APP_ENV").unwrap_or_else(|| "production".to_string());
        let is_development = app_env.eq_ignore_ascii_case("development");

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid PORT: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = match get("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if is_development => {
                warn!("JWT_SECRET not set! Using default secret for development. DO NOT USE IN PRODUCTION!");
                DEV_JWT_SECRET.to_string()
            }
            None => bail!("JWT_SECRET environment variable is required in production"),
        };
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            if is_development {
                warn!("JWT_SECRET is less than 32 characters. Consider using a longer secret.");
            } else {
                bail!("JWT_SECRET must be at least 32 characters in production");
            }
        }

        let orcid_raw = get("ORCID_API_URL").unwrap_or_else(|| DEFAULT_ORCID_API_URL.to_string());
        let orcid_api_url =
            Url::parse(&orcid_raw).map_err(|err| anyhow!("invalid ORCID_API_URL: {err}"))?;

        let activity_log_path = match lookup("ACTIVITY_LOG_PATH") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(PathBuf::from(raw.trim())),
            None => Some(PathBuf::from(DEFAULT_ACTIVITY_LOG_PATH)),
        };

        let rate_limit_per_minute = match get("RATE_LIMIT_PER_MINUTE") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| anyhow!("invalid RATE_LIMIT_PER_MINUTE: {raw}"))?,
            None => DEFAULT_RATE_LIMIT_PER_MINUTE,
        };

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            port,
            database_url: get("DATABASE_URL").filter(|s| !s.is_empty()),
            is_development,
            jwt_secret,
            orcid_api_url,
            activity_log_path,
            rate_limit_per_minute,
            cors_allowed_origins,
            log_format,
        })
    }

    /// In-memory storage, no activity file, development secret. Used by tests.
    pub fn development() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            is_development: true,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            orcid_api_url: Url::parse(DEFAULT_ORCID_API_URL)
                .expect("default ORCID URL is valid"),
            activity_log_path: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            cors_allowed_origins: Vec::new(),
            log_format: LogFormat::Text,
        }
    }
}
