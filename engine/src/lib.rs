//! Turn aggregation and session orchestration.
//!
//! A [`Session`] owns one [`HistoryLedger`](parley_context::HistoryLedger) and
//! runs each turn as:
//!
//! ```text
//! validate ─▶ append ─▶ params ─▶ transport.open ─▶ classify ─▶ aggregate ─▶ commit
//!                                                       │
//!                                                       └─▶ caller's mpsc channel
//! ```
//!
//! The [`StreamAggregator`] guarantees the commit step runs exactly once however
//! the turn ends.

mod aggregator;
mod errors;
mod session;
mod shared;

pub use aggregator::{
    CommitOutcome, CommitReport, EndReason, Step, StreamAggregator, THINKING_ONLY_PLACEHOLDER,
};
pub use errors::SessionError;
pub use session::{Session, SessionId, TurnReport};
pub use shared::SharedSession;

pub use parley_context;
pub use parley_providers;
pub use parley_types;
