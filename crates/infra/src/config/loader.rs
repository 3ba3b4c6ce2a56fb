//! Configuration loader
//!
//! Loads gateway configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file into the environment when one is present
//! 2. Attempts to load from environment variables
//! 3. If incomplete, falls back to loading from file
//! 4. Probes multiple paths for config files (JSON or TOML)
//! 5. With no file either, reports the missing variables as `Authentication`
//!
//! ## Environment Variables
//! Required:
//! - `TENDERDOCS_TENANT_ID`, `TENDERDOCS_CLIENT_ID`, `TENDERDOCS_SITE_URL`
//! - `TENDERDOCS_CERTIFICATE` (inline PEM) or `TENDERDOCS_CERTIFICATE_PATH`
//!
//! Optional:
//! - `TENDERDOCS_CERTIFICATE_PASSWORD`
//! - `TENDERDOCS_LIBRARY` (default `EPC_Tender_Docs`)
//! - `TENDERDOCS_AUTHORITY_HOST` (default `https://login.microsoftonline.com`)
//! - `TENDERDOCS_TOKEN_REFRESH_SKEW_SECS` (default 300)
//! - `TENDERDOCS_STORAGE_BUCKET`, `TENDERDOCS_STORAGE_ENDPOINT`,
//!   `TENDERDOCS_STORAGE_REGION`, `TENDERDOCS_STORAGE_ACCESS_KEY_ID`,
//!   `TENDERDOCS_STORAGE_SECRET_ACCESS_KEY`
//! - `TENDERDOCS_HTTP_TIMEOUT_SECS` (default 30),
//!   `TENDERDOCS_HTTP_MAX_ATTEMPTS` (default 1)
//!
//! ## File Locations
//! `TENDERDOCS_CONFIG` names the file explicitly. Otherwise the loader probes
//! `tenderdocs.{json,toml}` and `config.{json,toml}` in the working
//! directory, its parent, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tenderdocs_domain::{
    DocSyncConfig, DocSyncError, HttpConfig, Result, SharePointConfig, StorageConfig,
};

/// Explicit config file path.
pub const CONFIG_PATH_VAR: &str = "TENDERDOCS_CONFIG";

const FILE_NAMES: [&str; 4] = ["tenderdocs.json", "tenderdocs.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// When the environment is incomplete and no config file exists, the
/// environment error is returned so the missing settings are named.
///
/// # Errors
/// `DocSyncError::Authentication` naming every missing identity variable
/// when neither source is usable, `DocSyncError::Config` for malformed
/// values or files.
pub fn load() -> Result<DocSyncConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let env_error = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            return Ok(config);
        }
        Err(e) => e,
    };

    tracing::debug!(error = %env_error, "Failed to load from environment, trying file");
    let explicit = std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from);
    match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::warn!(error = %env_error, "No config file found, environment is incomplete");
            Err(env_error)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `DocSyncError::Authentication` listing every missing required
/// variable, or `DocSyncError::Config` if a numeric variable does not parse.
pub fn load_from_env() -> Result<DocSyncConfig> {
    let tenant_id = env_opt("TENDERDOCS_TENANT_ID");
    let client_id = env_opt("TENDERDOCS_CLIENT_ID");
    let site_url = env_opt("TENDERDOCS_SITE_URL");
    let certificate = env_opt("TENDERDOCS_CERTIFICATE");
    let certificate_path = env_opt("TENDERDOCS_CERTIFICATE_PATH").map(PathBuf::from);

    let mut missing = Vec::new();
    if tenant_id.is_none() {
        missing.push("TENDERDOCS_TENANT_ID");
    }
    if client_id.is_none() {
        missing.push("TENDERDOCS_CLIENT_ID");
    }
    if site_url.is_none() {
        missing.push("TENDERDOCS_SITE_URL");
    }
    if certificate.is_none() && certificate_path.is_none() {
        missing.push("TENDERDOCS_CERTIFICATE or TENDERDOCS_CERTIFICATE_PATH");
    }
    if !missing.is_empty() {
        return Err(DocSyncError::Authentication(format!(
            "Missing required environment variables: {}",
            missing.join(", ")
        )));
    }

    let defaults = DocSyncConfig::default();

    let sharepoint = SharePointConfig {
        tenant_id: tenant_id.unwrap_or_default(),
        client_id: client_id.unwrap_or_default(),
        certificate,
        certificate_path,
        certificate_password: env_opt("TENDERDOCS_CERTIFICATE_PASSWORD"),
        site_url: site_url.unwrap_or_default(),
        library_name: env_opt("TENDERDOCS_LIBRARY").unwrap_or(defaults.sharepoint.library_name),
        authority_host: env_opt("TENDERDOCS_AUTHORITY_HOST")
            .unwrap_or(defaults.sharepoint.authority_host),
        token_refresh_skew_secs: env_parse(
            "TENDERDOCS_TOKEN_REFRESH_SKEW_SECS",
            defaults.sharepoint.token_refresh_skew_secs,
        )?,
    };

    let storage = StorageConfig {
        bucket: env_opt("TENDERDOCS_STORAGE_BUCKET"),
        endpoint: env_opt("TENDERDOCS_STORAGE_ENDPOINT"),
        region: env_opt("TENDERDOCS_STORAGE_REGION").unwrap_or(defaults.storage.region),
        access_key_id: env_opt("TENDERDOCS_STORAGE_ACCESS_KEY_ID"),
        secret_access_key: env_opt("TENDERDOCS_STORAGE_SECRET_ACCESS_KEY"),
    };

    let http = HttpConfig {
        timeout_secs: env_parse("TENDERDOCS_HTTP_TIMEOUT_SECS", defaults.http.timeout_secs)?,
        max_attempts: env_parse("TENDERDOCS_HTTP_MAX_ATTEMPTS", defaults.http.max_attempts)?,
    };

    Ok(DocSyncConfig { sharepoint, storage, http })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
///
/// # Errors
/// Returns `DocSyncError::Config` if the file is missing, unreadable, or
/// not valid JSON/TOML.
pub fn load_from_file(path: Option<PathBuf>) -> Result<DocSyncConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DocSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DocSyncError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DocSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration, choosing the format by file extension.
fn parse_config(contents: &str, path: &Path) -> Result<DocSyncConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DocSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DocSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DocSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut directories = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        directories.push(cwd.clone());
        directories.push(cwd.join(".."));
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        directories.push(exe_dir);
    }

    directories
        .iter()
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Set and non-blank.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| DocSyncError::Config(format!("Invalid value for {key}: {e}"))),
        None => Ok(default),
    }
}
