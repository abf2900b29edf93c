//! Token counting.
//!
//! The ledger only needs a deterministic `text -> cost` function, so counting is a
//! trait seam: any `Fn(&str) -> u32` closure works, and [`TiktokenCounter`] provides
//! an **approximate** count using tiktoken encodings.
//!
//! - `o200k_base`: accurate for current OpenAI models, a reasonable approximation
//!   for the chat-completions vendors we talk to
//! - `cl100k_base`: the older encoding some vendors still document as their proxy
//!
//! Vendors with proprietary tokenizers will differ by a few percent; size the
//! budget with headroom.

use std::fmt;
use std::sync::OnceLock;

use serde::Deserialize;
use tiktoken_rs::{CoreBPE, cl100k_base, o200k_base};

/// Maps text to a non-negative token cost.
///
/// Implementations must be deterministic and side-effect free, and must return 0
/// for the empty string.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> u32;
}

impl<F> TokenCounter for F
where
    F: Fn(&str) -> u32 + Send + Sync,
{
    fn count(&self, text: &str) -> u32 {
        self(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerEncoding {
    #[default]
    O200kBase,
    Cl100kBase,
}

impl TokenizerEncoding {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenizerEncoding::O200kBase => "o200k_base",
            TokenizerEncoding::Cl100kBase => "cl100k_base",
        }
    }
}

// Encoders are expensive to initialize (vocabulary load), so each is built once
// per process and shared by every counter.
static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();
static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn get_encoder(encoding: TokenizerEncoding) -> Option<&'static CoreBPE> {
    match encoding {
        TokenizerEncoding::O200kBase => O200K.get_or_init(|| o200k_base().ok()).as_ref(),
        TokenizerEncoding::Cl100kBase => CL100K.get_or_init(|| cl100k_base().ok()).as_ref(),
    }
}

/// Thread-safe approximate token counter backed by a shared tiktoken encoder.
///
/// If the encoder fails to load, counts fall back to UTF-8 byte length, which
/// over-estimates and therefore keeps the budget conservative.
///
/// # Example
///
/// ```
/// use parley_context::{TiktokenCounter, TokenCounter};
///
/// let counter = TiktokenCounter::new();
/// assert!(counter.count("Hello, world!") > 0);
/// assert_eq!(counter.count(""), 0);
/// ```
#[derive(Clone, Copy)]
pub struct TiktokenCounter {
    encoding: TokenizerEncoding,
    encoder: Option<&'static CoreBPE>,
}

impl fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("encoding", &self.encoding.as_str())
            .field("encoder", &self.encoder.as_ref().map(|_| "<CoreBPE>"))
            .finish()
    }
}

impl TiktokenCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::with_encoding(TokenizerEncoding::default())
    }

    #[must_use]
    pub fn with_encoding(encoding: TokenizerEncoding) -> Self {
        let encoder = get_encoder(encoding);
        if encoder.is_none() {
            tracing::error!(
                encoding = encoding.as_str(),
                "Failed to initialize tiktoken encoder. Falling back to byte-length estimates."
            );
        }

        Self { encoding, encoder }
    }

    #[must_use]
    pub const fn encoding(&self) -> TokenizerEncoding {
        self.encoding
    }
}

impl Default for TiktokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }

        let len = match self.encoder {
            Some(encoder) => encoder.encode_ordinary(text).len(),
            None => text.len(),
        };

        u32::try_from(len).unwrap_or(u32::MAX)
    }
}
