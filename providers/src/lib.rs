//! Vendor stream classification and the transport seams around it.
//!
//! # Architecture
//!
//! Every supported vendor streams OpenAI-style `chat.completion.chunk` payloads.
//! A [`StreamClassifier`] turns one raw payload into exactly one [`StreamChunk`]:
//!
//! | Tag | Meaning |
//! |-----|---------|
//! | `End` | Vendor end-of-stream sentinel |
//! | `ToolCalls` | Tool-call fragments from `choices[0].delta.tool_calls` |
//! | `Reasoning` | Reasoning text (field name is vendor-specific) |
//! | `Content` | Visible answer text |
//! | `Empty` | Keepalives, role-only deltas, malformed or unknown shapes |
//!
//! Tags are checked in that order; the first match wins. Classification never
//! fails: anything that does not parse degrades to `Empty`.
//!
//! - [`deepseek`], [`doubao`]: `reasoning_content`
//! - [`qwen`]: `thinking`, falling back to `reasoning_content`
//! - [`kimi`]: `reasoning_content`, plus an in-choice usage terminator
//!
//! The network side lives behind [`Transport`] and [`RequestParamsSource`]; this
//! crate performs no I/O.

pub mod chunk_types;
pub mod deepseek;
pub mod doubao;
pub mod kimi;
pub mod qwen;
mod transport;

use serde::Deserialize;
use serde_json::Value;

pub use parley_types;
use parley_types::{StreamChunk, Vendor};

use chunk_types::{ChatChunk, Delta};
pub use transport::{
    ChunkStream, FixedParams, ParamsError, RequestParams, RequestParamsSource, Transport, TransportError,
};

/// Per-vendor chunk classification.
///
/// Implementors supply the vendor's end sentinel and reasoning field; the
/// precedence rules in [`classify`](StreamClassifier::classify) are shared.
pub trait StreamClassifier: Send + Sync {
    fn vendor(&self) -> Vendor;

    /// Whether `chunk` is the vendor's end-of-stream sentinel.
    fn is_end(&self, chunk: &ChatChunk) -> bool {
        chunk.is_usage_summary()
    }

    /// Reasoning text carried by `delta`, if any.
    fn reasoning<'a>(&self, delta: &'a Delta) -> Option<&'a str>;

    fn classify(&self, raw: &Value) -> StreamChunk {
        let Some(chunk) = parse_chunk(raw, self.vendor()) else {
            return StreamChunk::Empty;
        };

        if self.is_end(&chunk) {
            return StreamChunk::End;
        }

        let Some(delta) = chunk.first_choice().and_then(|choice| choice.delta.as_ref()) else {
            return StreamChunk::Empty;
        };

        if let Some(tool_calls) = delta.tool_calls.as_ref().filter(|calls| !calls.is_empty()) {
            return StreamChunk::ToolCalls(tool_calls.clone());
        }

        if let Some(reasoning) = self.reasoning(delta).filter(|text| !text.is_empty()) {
            return StreamChunk::Reasoning(reasoning.to_owned());
        }

        match delta.content.as_deref() {
            Some(content) if !content.is_empty() => StreamChunk::Content(content.to_owned()),
            _ => StreamChunk::Empty,
        }
    }
}

/// Builds the classifier for `vendor`.
#[must_use]
pub fn classifier_for(vendor: Vendor) -> Box<dyn StreamClassifier> {
    match vendor {
        Vendor::DeepSeek => Box::new(deepseek::DeepSeekClassifier),
        Vendor::Qwen => Box::new(qwen::QwenClassifier),
        Vendor::Kimi => Box::new(kimi::KimiClassifier),
        Vendor::Doubao => Box::new(doubao::DoubaoClassifier),
    }
}

pub(crate) fn parse_chunk(raw: &Value, vendor: Vendor) -> Option<ChatChunk> {
    match ChatChunk::deserialize(raw) {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            tracing::debug!(%e, vendor = vendor.as_str(), "Unrecognized stream chunk");
            None
        }
    }
}
