//! Core domain types for Parley.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the workspace.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod message;
mod model;
mod proofs;
mod stream;

use thiserror::Error;

pub use message::Message;
pub use model::{EnumKind, EnumParseError, Role, Vendor};
pub use proofs::{EmptyStringError, NonEmptyStaticStr, NonEmptyString};
pub use stream::{AccumulatedTurn, FunctionFragment, StreamChunk, ToolCall, ToolCallFragment};

/// Rejection of a caller-supplied message before it reaches the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    UnknownRole(#[from] EnumParseError),
    #[error("message content must not be empty")]
    EmptyContent,
}

impl From<EmptyStringError> for ValidationError {
    fn from(_: EmptyStringError) -> Self {
        ValidationError::EmptyContent
    }
}
