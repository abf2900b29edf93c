//! Qwen (DashScope compatible mode).
//!
//! Thinking-mode models stream reasoning in `delta.thinking` on some endpoints and
//! `delta.reasoning_content` on others; `thinking` is checked first.

use parley_types::Vendor;

use crate::StreamClassifier;
use crate::chunk_types::Delta;

#[derive(Debug, Clone, Copy, Default)]
pub struct QwenClassifier;

impl StreamClassifier for QwenClassifier {
    fn vendor(&self) -> Vendor {
        Vendor::Qwen
    }

    fn reasoning<'a>(&self, delta: &'a Delta) -> Option<&'a str> {
        delta
            .thinking
            .as_deref()
            .filter(|text| !text.is_empty())
            .or(delta.reasoning_content.as_deref())
    }
}
