//! Ledger message model.

use serde::{Deserialize, Serialize};

use crate::model::Role;

/// One conversation record as sent to the vendor.
///
/// `reasoning` is serialized under the chat-completions name `reasoning_content`
/// and omitted entirely when absent. An empty-string reasoning is still present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    #[serde(
        rename = "reasoning_content",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    reasoning: Option<String>,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            reasoning: None,
        }
    }

    #[must_use]
    pub fn with_reasoning(
        role: Role,
        content: impl Into<String>,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            reasoning: Some(reasoning.into()),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    #[must_use]
    pub fn has_reasoning(&self) -> bool {
        self.reasoning.is_some()
    }

    /// Removes the reasoning field, returning what was there.
    pub fn take_reasoning(&mut self) -> Option<String> {
        self.reasoning.take()
    }
}
