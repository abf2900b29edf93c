//! Conversation roles and vendor enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Author of a ledger message.
///
/// `System` doubles as the channel for feeding tool results back to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    System,
    Assistant,
}

const ROLE_PARSE_VALUES: &[&str] = &["user", "system", "assistant"];

/// Chat-completions vendors whose stream chunks we know how to classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vendor {
    #[default]
    DeepSeek,
    Qwen,
    Kimi,
    Doubao,
}

const VENDOR_PARSE_VALUES: &[&str] = &[
    "deepseek",
    "qwen",
    "tongyi",
    "kimi",
    "moonshot",
    "doubao",
    "ark",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    Role,
    Vendor,
}

impl EnumKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EnumKind::Role => "role",
            EnumKind::Vendor => "vendor",
        }
    }
}

impl fmt::Display for EnumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} value '{raw}'; expected one of: {expected:?}")]
pub struct EnumParseError {
    kind: EnumKind,
    raw: String,
    expected: &'static [&'static str],
}

impl EnumParseError {
    #[must_use]
    pub fn new(kind: EnumKind, raw: impl Into<String>, expected: &'static [&'static str]) -> Self {
        Self {
            kind,
            raw: raw.into(),
            expected,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> EnumKind {
        self.kind
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::System => "system",
            Role::Assistant => "assistant",
        }
    }

    #[must_use]
    pub fn all() -> &'static [Role] {
        &[Role::User, Role::System, Role::Assistant]
    }
}

impl FromStr for Role {
    type Err = EnumParseError;

    /// Role names are matched exactly after trimming; `"User"` is not a role.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Role::User),
            "system" => Ok(Role::System),
            "assistant" => Ok(Role::Assistant),
            other => Err(EnumParseError::new(
                EnumKind::Role,
                other,
                ROLE_PARSE_VALUES,
            )),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Vendor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Vendor::DeepSeek => "deepseek",
            Vendor::Qwen => "qwen",
            Vendor::Kimi => "kimi",
            Vendor::Doubao => "doubao",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Vendor::DeepSeek => "DeepSeek",
            Vendor::Qwen => "Qwen",
            Vendor::Kimi => "Kimi",
            Vendor::Doubao => "Doubao",
        }
    }

    #[must_use]
    pub fn all() -> &'static [Vendor] {
        &[Vendor::DeepSeek, Vendor::Qwen, Vendor::Kimi, Vendor::Doubao]
    }

    pub fn parse(s: &str) -> Result<Self, EnumParseError> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "deepseek" => Ok(Vendor::DeepSeek),
            "qwen" | "tongyi" => Ok(Vendor::Qwen),
            "kimi" | "moonshot" => Ok(Vendor::Kimi),
            "doubao" | "ark" => Ok(Vendor::Doubao),
            _ => Err(EnumParseError::new(
                EnumKind::Vendor,
                trimmed,
                VENDOR_PARSE_VALUES,
            )),
        }
    }
}

impl FromStr for Vendor {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Vendor::parse(s)
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
