use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Environment variable holding the static GitHub access token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_RAW_URL: &str = "https://gist.githubusercontent.com";

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub common: core_config::Config,
    pub github: GithubConfig,
    pub sharing: SharingConfig,
}

#[derive(Debug, Clone)]
pub struct GithubConfig {
    pub backend: GistBackend,
    pub api_base_url: String,
    pub raw_base_url: String,
    pub user_agent: String,
    /// Outbound timeout; the HTTP client's defaults apply when unset.
    pub request_timeout_secs: Option<u64>,
    /// Resolved once at startup. `None` only when creation is not served.
    pub token: Option<Secret<String>>,
}

#[derive(Debug, Clone)]
pub struct SharingConfig {
    /// Serve `POST /api`. Requires a token on the `github` backend.
    pub allow_create: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GistBackend {
    Github,
    Memory,
}

impl RelayConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: GistBackend = get_env("GIST_BACKEND", Some("github"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let allow_create = parse_bool(
            "GIST_ALLOW_CREATE",
            &get_env("GIST_ALLOW_CREATE", Some("true"), false)?,
        )?;

        let request_timeout_secs = match env::var("GIST_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Some(raw.parse().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!(
                    "GIST_REQUEST_TIMEOUT_SECS must be a number of seconds: {}",
                    e
                ))
            })?),
            Err(_) => None,
        };

        let token = if backend == GistBackend::Github && allow_create {
            Some(resolve_access_token(TOKEN_VAR)?)
        } else {
            resolve_access_token(TOKEN_VAR).ok()
        };

        Ok(RelayConfig {
            common: common_config,
            github: GithubConfig {
                backend,
                api_base_url: get_env("GITHUB_API_URL", Some(DEFAULT_API_URL), false)?,
                raw_base_url: get_env("GIST_RAW_URL", Some(DEFAULT_RAW_URL), false)?,
                user_agent: get_env("GIST_USER_AGENT", Some(&default_user_agent()), false)?,
                request_timeout_secs,
                token,
            },
            sharing: SharingConfig { allow_create },
        })
    }
}

impl GithubConfig {
    /// Settings pointing at the public GitHub endpoints.
    pub fn github_defaults(token: Option<Secret<String>>) -> Self {
        Self {
            backend: GistBackend::Github,
            api_base_url: DEFAULT_API_URL.to_string(),
            raw_base_url: DEFAULT_RAW_URL.to_string(),
            user_agent: default_user_agent(),
            request_timeout_secs: None,
            token,
        }
    }
}

impl std::str::FromStr for GistBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(GistBackend::Github),
            "memory" => Ok(GistBackend::Memory),
            _ => Err(format!("Invalid gist backend: {}", s)),
        }
    }
}

/// Read the static access credential from the environment.
///
/// A missing or blank value is a configuration error: the creation path must
/// not start without it.
pub fn resolve_access_token(var: &str) -> Result<Secret<String>, AppError> {
    match env::var(var) {
        Ok(token) if !token.trim().is_empty() => Ok(Secret::new(token)),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "Could not find environment variable {} for authentication",
            var
        ))),
    }
}

fn default_user_agent() -> String {
    format!("gist-relay/{}", env!("CARGO_PKG_VERSION"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be a boolean, got '{}'",
            key,
            other
        ))),
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
