//! Streaming classification types and the per-turn accumulator.

use serde::{Deserialize, Serialize};

/// Classification of one raw upstream chunk. Exactly one tag per chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Visible answer text.
    Content(String),
    /// Reasoning/"thinking" text.
    Reasoning(String),
    /// Tool-call fragments, in the order the vendor streamed them.
    ToolCalls(Vec<ToolCallFragment>),
    /// Vendor end-of-stream sentinel.
    End,
    /// Nothing usable: keepalives, role-only deltas, malformed or unknown shapes.
    Empty,
}

/// One streamed piece of a tool call, as emitted in `choices[0].delta.tool_calls`.
///
/// Every field is optional on the wire: the first fragment of a call usually
/// carries `id` and `function.name`, later ones only argument text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionFragment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// A complete tool call assembled from its fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Raw JSON argument text as streamed; parsing is left to the tool runner.
    pub arguments: String,
}

/// Working state for one assistant turn while it streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccumulatedTurn {
    content: String,
    reasoning: String,
    tool_calls: Vec<ToolCallFragment>,
}

impl AccumulatedTurn {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_content(&mut self, text: &str) {
        self.content.push_str(text);
    }

    pub fn push_reasoning(&mut self, text: &str) {
        self.reasoning.push_str(text);
    }

    pub fn extend_tool_calls(&mut self, fragments: impl IntoIterator<Item = ToolCallFragment>) {
        self.tool_calls.extend(fragments);
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCallFragment] {
        &self.tool_calls
    }

    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Groups fragments into whole calls.
    ///
    /// Fragments are keyed by `index`. A fragment without an index opens a new call
    /// when it carries an `id`, and otherwise continues the most recent call.
    /// Calls are returned in order of first appearance.
    #[must_use]
    pub fn assemble_tool_calls(&self) -> Vec<ToolCall> {
        let mut slots: Vec<(u32, ToolCall)> = Vec::new();
        let mut next_anonymous = u32::MAX;

        for fragment in &self.tool_calls {
            let key = match fragment.index {
                Some(index) => index,
                None if fragment.id.is_some() || slots.is_empty() => {
                    next_anonymous -= 1;
                    next_anonymous
                }
                None => slots.last().map_or(next_anonymous, |(key, _)| *key),
            };

            let position = match slots.iter().position(|(k, _)| *k == key) {
                Some(position) => position,
                None => {
                    slots.push((key, ToolCall::default()));
                    slots.len() - 1
                }
            };
            let call = &mut slots[position].1;

            if call.id.is_empty()
                && let Some(id) = &fragment.id
            {
                call.id.clone_from(id);
            }
            if let Some(function) = &fragment.function {
                if call.name.is_empty()
                    && let Some(name) = &function.name
                {
                    call.name.clone_from(name);
                }
                if let Some(arguments) = &function.arguments {
                    call.arguments.push_str(arguments);
                }
            }
        }

        slots.into_iter().map(|(_, call)| call).collect()
    }
}
