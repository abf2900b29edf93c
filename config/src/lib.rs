//! Configuration loading for Parley.
//!
//! Reads `~/.parley/config.toml`:
//!
//! ```toml
//! [session]
//! vendor = "deepseek"
//! model = "deepseek-chat"
//! max_tokens = 65536
//! system_prompt = "You are a helpful assistant."
//! # system_prompt_file = "${HOME}/.parley/prompt.md"
//!
//! [tokenizer]
//! encoding = "o200k_base"
//! ```
//!
//! Raw TOML is parsed into [`ParleyConfig`] and then resolved into validated
//! [`SessionSettings`].

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use parley_context::TokenizerEncoding;
use parley_types::Vendor;

pub const DEFAULT_MAX_TOKENS: u32 = 65_536;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path,
        }
    }

    fn invalid(path: &Path, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// The file as written.
#[derive(Debug, Default, Deserialize)]
pub struct ParleyConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionConfig {
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
    /// Path to a prompt file; `${VAR}` references are expanded and relative paths
    /// resolve against the config file's directory.
    pub system_prompt_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenizerConfig {
    #[serde(default)]
    pub encoding: TokenizerEncoding,
}

/// Validated settings for building a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub vendor: Vendor,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub encoding: TokenizerEncoding,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            vendor: Vendor::default(),
            model: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            encoding: TokenizerEncoding::default(),
        }
    }
}

impl SessionSettings {
    /// Loads from the default location. `Ok(None)` when there is no config file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let Some(config) = ParleyConfig::load_from(path)? else {
            return Ok(None);
        };
        config.resolve(path).map(Some)
    }
}

impl ParleyConfig {
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "Failed to read config");
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        toml::from_str(&content).map(Some).map_err(|err| {
            tracing::warn!(path = %path.display(), %err, "Failed to parse config");
            ConfigError::Parse {
                path: path.to_path_buf(),
                source: err,
            }
        })
    }

    /// Validates the raw values. `path` is the file they came from, used for
    /// error reporting and for resolving a relative `system_prompt_file`.
    pub fn resolve(self, path: &Path) -> Result<SessionSettings, ConfigError> {
        let SessionConfig {
            vendor,
            model,
            max_tokens,
            system_prompt,
            system_prompt_file,
        } = self.session;

        let vendor = match vendor {
            Some(raw) => {
                Vendor::parse(&raw).map_err(|err| ConfigError::invalid(path, err.to_string()))?
            }
            None => Vendor::default(),
        };

        let max_tokens = max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(ConfigError::invalid(
                path,
                "session.max_tokens must be greater than zero",
            ));
        }

        let system_prompt = match (system_prompt, system_prompt_file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::invalid(
                    path,
                    "set only one of session.system_prompt and session.system_prompt_file",
                ));
            }
            (Some(prompt), None) => prompt,
            (None, Some(file)) => read_prompt_file(path, &file)?,
            (None, None) => {
                return Err(ConfigError::invalid(
                    path,
                    "one of session.system_prompt or session.system_prompt_file is required",
                ));
            }
        };

        Ok(SessionSettings {
            vendor,
            model: model.filter(|m| !m.trim().is_empty()),
            max_tokens,
            system_prompt,
            encoding: self.tokenizer.encoding,
        })
    }
}

fn read_prompt_file(config_path: &Path, raw: &str) -> Result<String, ConfigError> {
    let expanded = PathBuf::from(expand_env_vars(raw));
    let prompt_path = if expanded.is_relative() {
        config_path
            .parent()
            .map_or_else(|| expanded.clone(), |dir| dir.join(&expanded))
    } else {
        expanded
    };

    fs::read_to_string(&prompt_path).map_err(|source| {
        tracing::warn!(path = %prompt_path.display(), %source, "Failed to read system prompt file");
        ConfigError::Read {
            path: prompt_path,
            source,
        }
    })
}

/// Replaces `${VAR}` with the variable's value (empty when unset).
///
/// An unterminated `${` is kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &after[..end];
        if !name.is_empty() {
            out.push_str(&env::var(name).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".parley").join("config.toml"))
}
