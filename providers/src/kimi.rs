//! Kimi (Moonshot).
//!
//! Besides the usual empty-`choices` usage summary, Moonshot closes a stream by
//! attaching `usage` to the final choice next to its `finish_reason`.

use parley_types::Vendor;

use crate::StreamClassifier;
use crate::chunk_types::{ChatChunk, Delta};

#[derive(Debug, Clone, Copy, Default)]
pub struct KimiClassifier;

impl StreamClassifier for KimiClassifier {
    fn vendor(&self) -> Vendor {
        Vendor::Kimi
    }

    fn is_end(&self, chunk: &ChatChunk) -> bool {
        if chunk.is_usage_summary() {
            return true;
        }
        chunk
            .first_choice()
            .is_some_and(|choice| choice.finish_reason.is_some() && choice.usage.is_some())
    }

    fn reasoning<'a>(&self, delta: &'a Delta) -> Option<&'a str> {
        delta.reasoning_content.as_deref()
    }
}
