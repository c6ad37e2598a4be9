//! Configuration loading and validation
//!
//! Settings are resolved in this order (highest priority first):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing default config file is not an error; a warning is logged and the
//! other sources apply. Required settings are checked once, at start-up.

use crate::admin::{split_list, AdminAllowList};
use crate::{Error, Result};
use reqwest::Url;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable names
pub mod env_keys {
    pub const CONFIG: &str = "SOUNDREAL_CONFIG";
    pub const PORT: &str = "SOUNDREAL_PORT";
    pub const BIND: &str = "SOUNDREAL_BIND";
    pub const SITE_URL: &str = "SOUNDREAL_SITE_URL";
    pub const HTTP_TIMEOUT_SECS: &str = "SOUNDREAL_HTTP_TIMEOUT_SECS";
    pub const LOG_LEVEL: &str = "SOUNDREAL_LOG_LEVEL";
    pub const SUPABASE_URL: &str = "SUPABASE_URL";
    pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
    pub const DATABASE_URL: &str = "DATABASE_URL";
    pub const ADMIN_EMAILS: &str = "ADMIN_EMAILS";
    pub const ADMIN_IDS: &str = "ADMIN_IDS";
}

/// Config file contents; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub site_url: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub bind: Option<String>,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub http_timeout_secs: Option<u64>,

    #[serde(default)]
    pub supabase: SupabaseToml,

    #[serde(default)]
    pub admin: AdminToml,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupabaseToml {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminToml {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub ids: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub site_url: Option<String>,
    pub database_url: Option<String>,
}

/// Identity provider endpoint and public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

/// Fully resolved and validated service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Base URL redirects are built on, without trailing slash
    pub site_url: String,
    pub bind: String,
    pub port: u16,
    pub database_url: String,
    pub supabase: SupabaseConfig,
    pub admins: AdminAllowList,
    /// Bound on every upstream call (identity provider, store connection)
    pub http_timeout: Duration,
    pub log_level: String,
}

impl ServiceConfig {
    /// Resolve from the process environment and the config file
    pub fn load(cli: &CliOverrides) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        let toml = match config_file_path(cli, &env) {
            ConfigFile::Explicit(path) => {
                info!("Loading config file {}", path.display());
                TomlConfig::load(&path)?
            }
            ConfigFile::Default(path) if path.exists() => {
                info!("Loading config file {}", path.display());
                TomlConfig::load(&path)?
            }
            ConfigFile::Default(path) => {
                warn!("Config file {} not found, using environment and defaults", path.display());
                TomlConfig::default()
            }
            ConfigFile::None => {
                warn!("No config directory on this platform, using environment and defaults");
                TomlConfig::default()
            }
        };
        Self::resolve(cli, env, toml)
    }

    /// Merge the three sources and validate the result
    pub fn resolve<F>(cli: &CliOverrides, env: F, toml: TomlConfig) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| non_blank(env(key));

        let site_url = cli.site_url.clone().or_else(|| env(env_keys::SITE_URL)).or(non_blank(toml.site_url));
        let database_url = cli
            .database_url
            .clone()
            .or_else(|| env(env_keys::DATABASE_URL))
            .or(non_blank(toml.database_url));
        let supabase_url = env(env_keys::SUPABASE_URL).or(non_blank(toml.supabase.url));
        let anon_key = env(env_keys::SUPABASE_ANON_KEY).or(non_blank(toml.supabase.anon_key));

        let port = match cli.port {
            Some(port) => port,
            None => match env(env_keys::PORT) {
                Some(raw) => parse_number(env_keys::PORT, &raw)?,
                None => toml.port.unwrap_or(DEFAULT_PORT),
            },
        };
        let timeout_secs = match env(env_keys::HTTP_TIMEOUT_SECS) {
            Some(raw) => parse_number(env_keys::HTTP_TIMEOUT_SECS, &raw)?,
            None => toml.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(Error::Config(format!("{} must be at least 1", env_keys::HTTP_TIMEOUT_SECS)));
        }
        let bind = cli
            .bind
            .clone()
            .or_else(|| env(env_keys::BIND))
            .or(non_blank(toml.bind))
            .map(|b| b.trim().to_string())
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let log_level = env(env_keys::LOG_LEVEL).unwrap_or(toml.logging.level);

        // Environment lists replace the file lists rather than extending them
        let admin_emails = env(env_keys::ADMIN_EMAILS)
            .map(|raw| split_list(&raw))
            .unwrap_or(toml.admin.emails);
        let admin_ids = env(env_keys::ADMIN_IDS)
            .map(|raw| split_list(&raw))
            .unwrap_or(toml.admin.ids);

        let missing: Vec<&str> = [
            (env_keys::SITE_URL, site_url.is_none()),
            (env_keys::SUPABASE_URL, supabase_url.is_none()),
            (env_keys::SUPABASE_ANON_KEY, anon_key.is_none()),
            (env_keys::DATABASE_URL, database_url.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(key, _)| key)
        .collect();

        let (Some(site_url), Some(supabase_url), Some(anon_key), Some(database_url)) =
            (site_url, supabase_url, anon_key, database_url)
        else {
            return Err(Error::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        };

        let site_url = validate_base_url(env_keys::SITE_URL, &site_url)?;
        let supabase_url = validate_base_url(env_keys::SUPABASE_URL, &supabase_url)?;

        Ok(Self {
            site_url,
            bind,
            port,
            database_url: database_url.trim().to_string(),
            supabase: SupabaseConfig {
                url: supabase_url,
                anon_key: anon_key.trim().to_string(),
            },
            admins: AdminAllowList::new(admin_emails, admin_ids),
            http_timeout: Duration::from_secs(timeout_secs),
            log_level,
        })
    }

    /// Whether cookies should carry the `Secure` attribute
    pub fn site_is_https(&self) -> bool {
        self.site_url.starts_with("https://")
    }

    /// Absolute URL for a path on the site
    pub fn site_path(&self, path: &str) -> String {
        format!("{}{}", self.site_url, path)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Where the config file comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFile {
    /// Named on the command line or in `SOUNDREAL_CONFIG`; must exist
    Explicit(PathBuf),
    /// Platform default; may be absent
    Default(PathBuf),
    None,
}

pub fn config_file_path<F>(cli: &CliOverrides, env: F) -> ConfigFile
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = &cli.config {
        return ConfigFile::Explicit(path.clone());
    }
    if let Some(path) = env(env_keys::CONFIG).filter(|p| !p.trim().is_empty()) {
        return ConfigFile::Explicit(PathBuf::from(path));
    }
    match default_config_path() {
        Some(path) => ConfigFile::Default(path),
        None => ConfigFile::None,
    }
}

/// `<config_dir>/soundreal/soundreal-auth.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("soundreal").join("soundreal-auth.toml"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} is not a valid number: {}", key, raw)))
}

/// Absolute http(s) URL, normalized and returned without trailing slash
///
/// Paths get appended to the result, so a query or fragment is rejected.
fn validate_base_url(key: &str, raw: &str) -> Result<String> {
    let url = Url::parse(raw.trim())
        .map_err(|e| Error::Config(format!("{} is not a valid URL ({}): {}", key, e, raw)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::Config(format!(
            "{} must be an absolute http or https URL: {}",
            key, raw
        )));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(Error::Config(format!(
            "{} must not carry a query string or fragment: {}",
            key, raw
        )));
    }

    // Serialized form is ASCII-only, so it is always a valid header value
    Ok(url.as_str().trim_end_matches('/').to_string())
}
