//! Configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use etisgrade_core::traits::Credentials;

pub const DEFAULT_BASE_URL: &str = "https://student.psu.ru/pls/stu_cus_et";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_TIMEOUT_SECS: u64 = 600;
const MAX_CHART_SIDE: u32 = 10_000;

/// How to reach the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSettings {
    /// Base URL the `stu.*` procedures live under.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Skip TLS certificate validation. Off unless explicitly enabled.
    #[serde(default)]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            accept_invalid_certs: false,
            user_agent: default_user_agent(),
        }
    }
}

/// Stored login. Both fields may reference environment variables as `${VAR}`.
///
/// Note: Custom Debug impl masks the password to prevent accidental exposure in logs.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Chart rendering options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartSettings {
    /// TrueType font used for chart text.
    #[serde(default)]
    pub font_path: Option<PathBuf>,
    /// Bar chart size in pixels.
    #[serde(default)]
    pub bar_size: Option<(u32, u32)>,
    /// Line chart size in pixels.
    #[serde(default)]
    pub line_size: Option<(u32, u32)>,
}

/// Top-level etisgrade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtisConfig {
    #[serde(default)]
    pub portal: PortalSettings,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub charts: ChartSettings,
    /// Where the CLI writes artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_user_agent() -> String {
    format!("etisgrade/{}", env!("CARGO_PKG_VERSION"))
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./etisgrade-out")
}

impl Default for EtisConfig {
    fn default() -> Self {
        Self {
            portal: PortalSettings::default(),
            credentials: CredentialsConfig::default(),
            charts: ChartSettings::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl EtisConfig {
    /// Resolve the login, letting `username` override the configured one.
    pub fn credentials(&self, username: Option<&str>) -> Result<Credentials> {
        let username = username
            .map(str::to_string)
            .or_else(|| self.credentials.username.clone())
            .filter(|u| !u.is_empty())
            .context("no username given; pass --username or set ETISGRADE_USERNAME")?;
        let password = self
            .credentials
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .context("no password configured; set ETISGRADE_PASSWORD or [credentials].password")?;
        Ok(Credentials::new(username, password))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `etisgrade.toml` in the current directory
/// 2. `~/.config/etisgrade/config.toml`
///
/// Environment variable overrides: `ETISGRADE_USERNAME`, `ETISGRADE_PASSWORD`.
pub fn load_config() -> Result<EtisConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<EtisConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("etisgrade.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => EtisConfig::default(),
    };

    if let Ok(username) = std::env::var("ETISGRADE_USERNAME") {
        config.credentials.username = Some(username);
    }
    if let Ok(password) = std::env::var("ETISGRADE_PASSWORD") {
        config.credentials.password = Some(password);
    }

    Ok(config)
}

/// Parse a TOML document, resolve `${VAR}` references and check limits.
pub fn parse_config(content: &str) -> Result<EtisConfig> {
    let mut config: EtisConfig = toml::from_str(content)?;

    config.portal.base_url = resolve_env_vars(&config.portal.base_url);
    config.credentials.username = config.credentials.username.as_deref().map(resolve_env_vars);
    config.credentials.password = config.credentials.password.as_deref().map(resolve_env_vars);

    anyhow::ensure!(
        (1..=MAX_TIMEOUT_SECS).contains(&config.portal.timeout_secs),
        "portal.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
    );
    anyhow::ensure!(
        config.portal.base_url.starts_with("http://") || config.portal.base_url.starts_with("https://"),
        "portal.base_url must be an http(s) URL"
    );
    for (name, size) in [
        ("charts.bar_size", config.charts.bar_size),
        ("charts.line_size", config.charts.line_size),
    ] {
        if let Some((width, height)) = size {
            anyhow::ensure!(
                (1..=MAX_CHART_SIDE).contains(&width) && (1..=MAX_CHART_SIDE).contains(&height),
                "{name} must be between 1 and {MAX_CHART_SIDE} pixels per side"
            );
        }
    }

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("etisgrade"))
}
