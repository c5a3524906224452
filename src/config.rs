//! Runtime configuration read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Result, TryOnError};
use crate::provider::gemini::DEFAULT_GEMINI_MODEL;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const STATIC_PREFIX: &str = "/static";
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// What to do when the provider fails. Each failure class is decided on its
/// own; `false` surfaces the classified error to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub on_retryable: bool,
    pub on_fatal: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub secret_key: Option<String>,
    pub storage_dir: PathBuf,
    /// Prefix for access URLs, either `/static` or `<PUBLIC_BASE_URL>/static`.
    pub public_base_url: String,
    pub gemini_api_key: Option<String>,
    pub model: String,
    pub provider_timeout: Duration,
    pub fallback: FallbackPolicy,
    /// Browser origins allowed by CORS, serialized as `scheme://host[:port]`.
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match get("TRYON_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| TryOnError::Config(format!("TRYON_PORT is not a port: {raw}")))?,
            None => DEFAULT_PORT,
        };
        let provider_timeout = match get("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(TryOnError::Config(format!(
                        "PROVIDER_TIMEOUT_SECS must be a positive integer: {raw}"
                    )));
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let storage_dir = get("STORAGE_DIR").map(PathBuf::from).unwrap_or_else(|| {
            let mut base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            base.push("outfit-tryon");
            base
        });
        let public_base_url = match get("PUBLIC_BASE_URL") {
            Some(raw) => resolve_public_base_url(&raw)?,
            None => STATIC_PREFIX.to_string(),
        };
        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(raw) => parse_allowed_origins(&raw)?,
            None => vec![DEFAULT_ALLOWED_ORIGIN.to_string()],
        };

        Ok(Self {
            port,
            secret_key: get("SECRET_KEY"),
            storage_dir,
            public_base_url,
            gemini_api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            model: get("NANOBANANA_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            provider_timeout,
            fallback: FallbackPolicy {
                on_retryable: parse_flag("FALLBACK_ON_QUOTA", get("FALLBACK_ON_QUOTA"))?,
                on_fatal: parse_flag("FALLBACK_ON_ERROR", get("FALLBACK_ON_ERROR"))?,
            },
            allowed_origins,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn db_dir(&self) -> PathBuf {
        self.storage_dir.join("db")
    }
}

fn resolve_public_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw)
        .map_err(|err| TryOnError::Config(format!("PUBLIC_BASE_URL is invalid: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(format!(
            "{}{STATIC_PREFIX}",
            parsed.as_str().trim_end_matches('/')
        )),
        scheme => Err(TryOnError::Config(format!(
            "PUBLIC_BASE_URL must be http or https, got {scheme}"
        ))),
    }
}

/// Comma-separated list of http(s) origins. Paths are not allowed.
fn parse_allowed_origins(raw: &str) -> Result<Vec<String>> {
    let mut origins = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let parsed = Url::parse(entry).map_err(|err| {
            TryOnError::Config(format!("ALLOWED_ORIGINS entry {entry} is invalid: {err}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.path() != "/" {
            return Err(TryOnError::Config(format!(
                "ALLOWED_ORIGINS entry {entry} is not an http(s) origin"
            )));
        }
        origins.push(parsed.origin().ascii_serialization());
    }
    if origins.is_empty() {
        return Err(TryOnError::Config("ALLOWED_ORIGINS is empty".to_string()));
    }
    Ok(origins)
}

fn parse_flag(key: &str, raw: Option<String>) -> Result<bool> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TryOnError::Config(format!("{key} is not a boolean: {raw}"))),
    }
}
