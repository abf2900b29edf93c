//! Token-budgeted conversation history.
//!
//! This crate provides:
//! - A [`TokenCounter`] seam plus a tiktoken-backed implementation
//! - [`HistoryLedger`]: the per-session message buffer with a pinned system
//!   prompt, FIFO prefix eviction, and an ephemeral reasoning index
//!
//! # Architecture
//!
//! ```text
//! HistoryLedger
//! ├── prompt: pinned entry (never evicted)
//! ├── entries: VecDeque<LedgerEntry> (oldest first, evicted from the front)
//! ├── ephemeral: EphemeralIndex (message ids still carrying reasoning)
//! └── counter: Box<dyn TokenCounter>
//! ```

mod ephemeral;
mod history;
mod token_counter;

pub use ephemeral::{EphemeralEntry, EphemeralIndex};
pub use history::{BudgetExceeded, HistoryLedger, LedgerConfigError, MessageId};
pub use token_counter::{TiktokenCounter, TokenCounter, TokenizerEncoding};
