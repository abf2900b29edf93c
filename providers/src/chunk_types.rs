//! Typed chat-completions stream chunks.
//!
//! Every vendor we classify streams the same `chat.completion.chunk` envelope and
//! only differs in where reasoning text lives and how the stream ends. Parsing into
//! these structs keeps field access typed; anything we do not read is ignored.

use serde::Deserialize;

use parley_types::ToolCallFragment;

/// One `chat.completion.chunk` payload.
#[derive(Debug, Default, Deserialize)]
pub struct ChatChunk {
    /// `None` when the key is absent; `Some(vec![])` for the explicit empty list
    /// vendors send alongside the trailing usage summary.
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatChunk {
    /// `choices == []` paired with a usage summary: the trailing chunk most
    /// vendors send when `stream_options.include_usage` is set.
    #[must_use]
    pub fn is_usage_summary(&self) -> bool {
        matches!(&self.choices, Some(choices) if choices.is_empty()) && self.usage.is_some()
    }

    #[must_use]
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.as_ref().and_then(|choices| choices.first())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: Option<u32>,
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,
    /// Kimi reports usage inside the final choice instead of at the top level.
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
    /// Qwen's deep-thinking field.
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallFragment>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    FunctionCall,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}
