//! License key resolution for the ingestion API
//!
//! The key comes either from an environment variable or from the
//! `license_key=` line of a local configuration file. Exactly one strategy
//! is active per process; resolution runs once at startup and any failure
//! is fatal to the caller.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default environment variable holding the license key
pub const DEFAULT_TOKEN_ENV_VAR: &str = "NEWRELIC_TOKEN";

/// Default location of the server monitor configuration file
pub const DEFAULT_LICENSE_FILE: &str = "/etc/newrelic/nrsysmond.cfg";

const LICENSE_KEY_PREFIX: &str = "license_key=";

/// Errors raised while resolving the license key
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("{0} is not set")]
    MissingVariable(String),

    #[error("{0} is set but blank")]
    BlankVariable(String),

    #[error("license file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    #[error("failed to read license file {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no license_key entry found in {}", .0.display())]
    MissingLicenseKey(PathBuf),
}

/// Which strategy to use when resolving the license key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    #[default]
    Env,
    File,
}

/// A configured credential strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Read the key from the named environment variable
    Env { var: String },
    /// Read the key from a `license_key=` line in the given file
    File { path: PathBuf },
}

impl CredentialSource {
    pub fn env(var: impl Into<String>) -> Self {
        Self::Env { var: var.into() }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    /// Short label for logging
    pub fn describe(&self) -> String {
        match self {
            Self::Env { var } => format!("env:{}", var),
            Self::File { path } => format!("file:{}", path.display()),
        }
    }

    /// Resolve a trimmed, non-empty license key
    pub fn resolve(&self) -> Result<String, CredentialError> {
        match self {
            Self::Env { var } => {
                let value = std::env::var(var)
                    .map_err(|_| CredentialError::MissingVariable(var.clone()))?;
                resolve_token_value(var, &value)
            }
            Self::File { path } => read_license_file(path),
        }
    }
}

/// Trim an environment value, rejecting blanks
fn resolve_token_value(var: &str, value: &str) -> Result<String, CredentialError> {
    let token = value.trim();
    if token.is_empty() {
        return Err(CredentialError::BlankVariable(var.to_string()));
    }
    Ok(token.to_string())
}

fn read_license_file(path: &Path) -> Result<String, CredentialError> {
    if !path.exists() {
        return Err(CredentialError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| CredentialError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    parse_license_key(&content).ok_or_else(|| CredentialError::MissingLicenseKey(path.to_path_buf()))
}

/// Extract the value of the first `license_key=` assignment
///
/// Comment lines starting with `#` or `;` are skipped. Returns `None` when
/// no assignment exists or its value is blank.
pub fn parse_license_key(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#') && !line.starts_with(';'))
        .find_map(|line| line.strip_prefix(LICENSE_KEY_PREFIX))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
