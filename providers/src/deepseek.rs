//! DeepSeek (`deepseek-chat`, `deepseek-reasoner`).
//!
//! Reasoner models stream their chain of thought in `delta.reasoning_content`
//! before any `delta.content`. With `include_usage` the stream closes with an
//! empty `choices` list carrying the usage summary.

use parley_types::Vendor;

use crate::StreamClassifier;
use crate::chunk_types::Delta;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeepSeekClassifier;

impl StreamClassifier for DeepSeekClassifier {
    fn vendor(&self) -> Vendor {
        Vendor::DeepSeek
    }

    fn reasoning<'a>(&self, delta: &'a Delta) -> Option<&'a str> {
        delta.reasoning_content.as_deref()
    }
}
