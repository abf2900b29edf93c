//! Doubao (Volcengine Ark).
//!
//! Deep-thinking models use the same `reasoning_content` delta field and usage
//! terminator as DeepSeek.

use parley_types::Vendor;

use crate::StreamClassifier;
use crate::chunk_types::Delta;

#[derive(Debug, Clone, Copy, Default)]
pub struct DoubaoClassifier;

impl StreamClassifier for DoubaoClassifier {
    fn vendor(&self) -> Vendor {
        Vendor::Doubao
    }

    fn reasoning<'a>(&self, delta: &'a Delta) -> Option<&'a str> {
        delta.reasoning_content.as_deref()
    }
}
